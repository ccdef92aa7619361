use serde_json::Value;

use super::ExtractionError;
use crate::analysis::{normalize_name, BiomarkerValue};

/// Parse the model's text answer into readings.
///
/// Markdown fences are stripped, the body must be a JSON object, keys are
/// normalized and non-numeric values are skipped. When the same key
/// appears twice the later value wins.
pub fn parse_extraction_response(
    response: &str,
) -> Result<Vec<(String, BiomarkerValue)>, ExtractionError> {
    let body = strip_code_fences(response);

    let parsed: Value =
        serde_json::from_str(body).map_err(|e| ExtractionError::JsonParsing(e.to_string()))?;

    let Value::Object(map) = parsed else {
        return Err(ExtractionError::MalformedResponse(
            "expected a JSON object".into(),
        ));
    };

    let mut readings: Vec<(String, BiomarkerValue)> = Vec::with_capacity(map.len());
    for (raw_name, raw_value) in &map {
        let name = normalize_name(raw_name);
        if name.is_empty() {
            continue;
        }
        let Ok(value) = BiomarkerValue::from_json(&name, raw_value) else {
            tracing::debug!(biomarker = %name, "Skipping non-numeric extracted value");
            continue;
        };
        match readings.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => readings.push((name, value)),
        }
    }

    if readings.is_empty() {
        return Err(ExtractionError::NoBiomarkers);
    }
    Ok(readings)
}

/// Remove a leading Markdown code fence (with or without a `json` tag) and
/// a trailing one.
fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}
