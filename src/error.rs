//! Typed failures surfaced by the analysis core and its I/O adapters.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("event batch is empty")]
    EmptyBatch,
    #[error("malformed event at row {row}: field `{field}` {reason}")]
    MalformedEvent {
        row: usize,
        field: &'static str,
        reason: String,
    },
    #[error("feature computation failed: {0}")]
    FeatureComputation(String),
}

/// Failures reading event files or writing exports.
#[derive(Debug, Error)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
