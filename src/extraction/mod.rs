pub mod gemini;
pub mod parser;
pub mod prompt;
pub mod validate;

pub use gemini::*;
pub use parser::*;
pub use prompt::*;
pub use validate::*;

use thiserror::Error;

use crate::analysis::BiomarkerValue;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Extraction service unreachable at {0}")]
    Connection(String),

    #[error("Extraction service returned error (status {status}): {body}")]
    Provider { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("No valid biomarker found in the document")]
    NoBiomarkers,

    #[error("The PDF file is empty")]
    EmptyPdf,

    #[error("PDF too large ({size_mb:.1} MB). Maximum: {max_mb} MB")]
    PdfTooLarge { size_mb: f64, max_mb: u64 },

    #[error("The uploaded file is not a PDF")]
    NotPdf,

    #[error("PDF extraction is not configured")]
    NotConfigured,
}

/// Turns a lab report PDF into `(name, value)` readings.
///
/// Implementations block; call them from `spawn_blocking`.
pub trait BiomarkerExtractor: Send + Sync {
    fn extract(&self, pdf: &[u8]) -> Result<Vec<(String, BiomarkerValue)>, ExtractionError>;
}
