use serde::{Deserialize, Serialize};

use super::enums::BiomarkerStatus;

/// Result of classifying one submitted biomarker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(rename = "biomarker")]
    pub display_name: String,
    pub value: f64,
    pub unit: String,
    pub status: BiomarkerStatus,
    #[serde(rename = "min_value")]
    pub min_bound: f64,
    #[serde(rename = "max_value")]
    pub max_bound: f64,
    pub explanation: String,
    pub advice: String,
}

/// Per-request status counts. All four keys are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSummary {
    pub normal: u32,
    pub low: u32,
    pub high: u32,
    pub unknown: u32,
}

impl AnalysisSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one processed biomarker under its final status.
    pub fn record(&mut self, status: BiomarkerStatus) {
        match status {
            BiomarkerStatus::Normal => self.normal += 1,
            BiomarkerStatus::Low => self.low += 1,
            BiomarkerStatus::High => self.high += 1,
            BiomarkerStatus::Unknown => self.unknown += 1,
        }
    }

    pub fn count(&self, status: BiomarkerStatus) -> u32 {
        match status {
            BiomarkerStatus::Normal => self.normal,
            BiomarkerStatus::Low => self.low,
            BiomarkerStatus::High => self.high,
            BiomarkerStatus::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> u32 {
        self.normal + self.low + self.high + self.unknown
    }
}

/// Records plus summary, the shape shared by the response formatter and
/// the PDF renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub results: Vec<AnalysisRecord>,
    pub summary: AnalysisSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_starts_at_zero() {
        let summary = AnalysisSummary::new();
        assert_eq!(summary.total(), 0);
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"normal": 0, "low": 0, "high": 0, "unknown": 0})
        );
    }

    #[test]
    fn record_increments_one_counter() {
        let mut summary = AnalysisSummary::new();
        summary.record(BiomarkerStatus::Low);
        summary.record(BiomarkerStatus::Low);
        summary.record(BiomarkerStatus::Unknown);
        assert_eq!(summary.count(BiomarkerStatus::Low), 2);
        assert_eq!(summary.count(BiomarkerStatus::Unknown), 1);
        assert_eq!(summary.count(BiomarkerStatus::Normal), 0);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn summary_missing_keys_default_to_zero() {
        let summary: AnalysisSummary = serde_json::from_str(r#"{"normal": 2}"#).unwrap();
        assert_eq!(summary.normal, 2);
        assert_eq!(summary.unknown, 0);
    }

    #[test]
    fn record_uses_wire_field_names() {
        let record = AnalysisRecord {
            display_name: "Vitamine D".into(),
            value: 18.0,
            unit: "ng/mL".into(),
            status: BiomarkerStatus::Low,
            min_bound: 30.0,
            max_bound: 100.0,
            explanation: "x".into(),
            advice: "y".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["biomarker"], "Vitamine D");
        assert_eq!(json["status"], "low");
        assert_eq!(json["min_value"], 30.0);
        assert_eq!(json["max_value"], 100.0);
    }
}
