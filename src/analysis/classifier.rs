use super::catalog::ReferenceCatalog;
use super::input::BiomarkerValue;
use super::normalize::normalize_name;
use crate::models::enums::{BiomarkerStatus, RangeStatus};
use crate::models::{AnalysisRecord, AnalysisReport, AnalysisSummary};

pub const UNKNOWN_UNIT: &str = "N/A";
pub const UNKNOWN_EXPLANATION: &str = "This biomarker is not yet referenced in our database.";
pub const UNKNOWN_ADVICE: &str = "Consult a healthcare professional to interpret this value.";

/// Boundary-inclusive range rule. Comparison is exact, no tolerance.
pub fn classify_value(value: f64, min_bound: f64, max_bound: f64) -> RangeStatus {
    if value < min_bound {
        RangeStatus::Low
    } else if value > max_bound {
        RangeStatus::High
    } else {
        RangeStatus::Normal
    }
}

/// Classify one reading against the catalog.
pub fn classify_reading(
    raw_name: &str,
    value: BiomarkerValue,
    catalog: &dyn ReferenceCatalog,
) -> AnalysisRecord {
    let value = value.get();
    let Some(entry) = catalog.lookup(&normalize_name(raw_name)) else {
        return AnalysisRecord {
            display_name: raw_name.to_string(),
            value,
            unit: UNKNOWN_UNIT.to_string(),
            status: BiomarkerStatus::Unknown,
            min_bound: 0.0,
            max_bound: 0.0,
            explanation: UNKNOWN_EXPLANATION.to_string(),
            advice: UNKNOWN_ADVICE.to_string(),
        };
    };

    let status = classify_value(value, entry.min_bound, entry.max_bound);
    AnalysisRecord {
        display_name: entry.display_name.clone(),
        value,
        unit: entry.unit.clone(),
        status: status.into(),
        min_bound: entry.min_bound,
        max_bound: entry.max_bound,
        explanation: entry.explanation.clone(),
        advice: entry.advice_for(status).to_string(),
    }
}

/// Classify every reading in submission order and count the statuses.
/// Pure: no I/O and the catalog is only read.
pub fn analyze(readings: &[(String, BiomarkerValue)], catalog: &dyn ReferenceCatalog) -> AnalysisReport {
    let mut summary = AnalysisSummary::new();
    let results: Vec<AnalysisRecord> = readings
        .iter()
        .map(|(name, value)| {
            let record = classify_reading(name, *value, catalog);
            summary.record(record.status);
            record
        })
        .collect();

    AnalysisReport { results, summary }
}
