use serde::{Deserialize, Serialize};

use super::enums::RangeStatus;

/// Shared fallback when a reference entry carries no advice for a status.
pub const ADVICE_FALLBACK: &str = "Consult a healthcare professional for more information.";

/// Stored normal range and explanatory text for one biomarker.
///
/// Field names on the wire follow the `biomarkers` table (`name`,
/// `min_value`, `max_value`) so the bundled seed file and the listing
/// endpoint share one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    #[serde(rename = "name")]
    pub canonical_name: String,
    pub display_name: String,
    pub unit: String,
    #[serde(rename = "min_value")]
    pub min_bound: f64,
    #[serde(rename = "max_value")]
    pub max_bound: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub explanation: String,
    #[serde(default)]
    pub advice_low: Option<String>,
    #[serde(default)]
    pub advice_high: Option<String>,
    #[serde(default)]
    pub advice_normal: Option<String>,
}

impl ReferenceEntry {
    /// Advice text for a range status. Empty or missing advice falls back
    /// to [`ADVICE_FALLBACK`], so the result is never empty.
    pub fn advice_for(&self, status: RangeStatus) -> &str {
        let selected = match status {
            RangeStatus::Low => self.advice_low.as_deref(),
            RangeStatus::High => self.advice_high.as_deref(),
            RangeStatus::Normal => self.advice_normal.as_deref(),
        };
        selected
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(ADVICE_FALLBACK)
    }
}

/// Catalog entry as exposed by `GET /api/biomarkers` (no advice texts).
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceListing {
    pub name: String,
    pub display_name: String,
    pub unit: String,
    pub min_value: f64,
    pub max_value: f64,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl From<&ReferenceEntry> for ReferenceListing {
    fn from(entry: &ReferenceEntry) -> Self {
        Self {
            name: entry.canonical_name.clone(),
            display_name: entry.display_name.clone(),
            unit: entry.unit.clone(),
            min_value: entry.min_bound,
            max_value: entry.max_bound,
            category: entry.category.clone(),
            description: entry.description.clone(),
        }
    }
}
