use crate::models::AnalysisSummary;

/// Human-readable outcome line derived from the summary counts.
pub fn compose_message(summary: &AnalysisSummary) -> String {
    let total = summary.total();
    if total > 0 && summary.unknown == total {
        "No biomarker recognized. Check the biomarker names.".to_string()
    } else if summary.unknown > 0 {
        format!(
            "Analysis completed. {} biomarker(s) not recognized.",
            summary.unknown
        )
    } else {
        format!("Analysis completed successfully! {total} biomarker(s) analyzed.")
    }
}
