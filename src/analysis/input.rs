use serde::Serialize;
use serde_json::{Map, Value};

use super::AnalysisError;

/// A finite number submitted for a biomarker.
///
/// Accepts JSON numbers and numeric strings (`"13.2"`, `"13,2"`). Anything
/// else, including NaN and infinities, is rejected at the boundary so the
/// classifier only ever sees real values.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct BiomarkerValue(f64);

impl BiomarkerValue {
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Parse a numeric string. A single comma is accepted as the decimal
    /// separator.
    pub fn parse_str(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let dotted = trimmed.replace(',', ".");
        dotted.parse::<f64>().ok().and_then(Self::new)
    }

    pub fn from_json(name: &str, value: &Value) -> Result<Self, AnalysisError> {
        let malformed = |reason: &str| AnalysisError::MalformedValue {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        match value {
            Value::Number(n) => n
                .as_f64()
                .and_then(Self::new)
                .ok_or_else(|| malformed("number out of range")),
            Value::String(s) => Self::parse_str(s).ok_or_else(|| malformed("not a numeric string")),
            Value::Null => Err(malformed("missing value")),
            _ => Err(malformed("expected a number")),
        }
    }
}

impl From<BiomarkerValue> for f64 {
    fn from(value: BiomarkerValue) -> Self {
        value.0
    }
}

/// One entry refused at the boundary, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedEntry {
    pub name: String,
    pub reason: String,
}

/// Validated request payload: accepted readings in submission order plus
/// the entries that could not be read as numbers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BiomarkerInput {
    pub readings: Vec<(String, BiomarkerValue)>,
    pub rejected: Vec<RejectedEntry>,
}

impl BiomarkerInput {
    /// Split a raw JSON object into readings and rejected entries. One bad
    /// value never aborts the rest of the batch.
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let mut input = Self::default();
        for (name, value) in map {
            match BiomarkerValue::from_json(name, value) {
                Ok(v) => input.readings.push((name.clone(), v)),
                Err(e) => {
                    tracing::debug!(biomarker = %name, error = %e, "Rejected biomarker value");
                    let reason = match e {
                        AnalysisError::MalformedValue { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    input.rejected.push(RejectedEntry {
                        name: name.clone(),
                        reason,
                    });
                }
            }
        }
        input
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}
