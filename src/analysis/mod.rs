//! Biomarker classification engine.
//!
//! Raw `(name, value)` pairs are normalized, looked up in a read-only
//! [`ReferenceCatalog`], classified against the stored range and counted
//! into an [`AnalysisSummary`](crate::models::AnalysisSummary).

pub mod catalog;
pub mod classifier;
pub mod input;
pub mod message;
pub mod normalize;

pub use catalog::*;
pub use classifier::*;
pub use input::*;
pub use message::*;
pub use normalize::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Value for '{name}' is not a number: {reason}")]
    MalformedValue { name: String, reason: String },

    #[error("No biomarker provided")]
    EmptyInput,
}
