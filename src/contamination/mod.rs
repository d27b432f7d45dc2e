//! Expected outlier fraction for a batch, estimated from cheap proxy signals.

mod estimator;

pub use estimator::{estimate, is_suspect};

/// Lower bound of the estimate; also returned for batches with no suspect rows.
pub const CONTAMINATION_FLOOR: f64 = 0.05;
/// Upper bound; keeps an all-error batch from being labelled wholesale.
pub const CONTAMINATION_CEILING: f64 = 0.5;
/// Server-side failures count toward the estimate (client errors do not).
pub const SERVER_ERROR_STATUS_THRESHOLD: u16 = 500;
/// Per-user z-score above which a response is a suspect outlier.
pub const ZSCORE_SUSPECT_THRESHOLD: f64 = 3.0;
