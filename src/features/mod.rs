//! Statistical feature derivation from a batch of request events.

mod pipeline;
mod time;
mod user;

pub use pipeline::FeatureDeriver;
pub use time::{parse_timestamp, TimeOfDay};
pub use user::{mean, sample_std, UserProfile};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Status codes at or above this count as errors for per-user error rates.
pub const ERROR_STATUS_THRESHOLD: u16 = 400;
/// Hours (0-23) treated as outside normal activity.
pub const OFF_HOURS: [u32; 8] = [22, 23, 0, 1, 2, 3, 4, 5];
/// A response slower than `batch_mean + SLOW_RESPONSE_SIGMA * batch_std` is slow.
pub const SLOW_RESPONSE_SIGMA: f64 = 2.0;

/// Column order of [`FeatureTable::to_matrix`].
pub const FEATURE_NAMES: [&str; 16] = [
    "response_time",
    "status_code",
    "hour",
    "minute_of_day",
    "user_request_count",
    "user_avg_response",
    "user_std_response",
    "user_avg_status",
    "user_error_rate",
    "response_deviation",
    "response_zscore",
    "global_response_zscore",
    "requests_in_hour",
    "user_error_deviation",
    "is_off_hours",
    "slow_response",
];

pub const FEATURE_DIM: usize = FEATURE_NAMES.len();

/// Derived signals for one event. Never mutated after derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub response_time: f64,
    pub status_code: u16,
    pub hour: u32,
    pub minute_of_day: u32,
    /// False when `hour`/`minute_of_day` came from the row-position fallback
    pub timestamp_parsed: bool,
    pub user_request_count: usize,
    pub user_avg_response: f64,
    pub user_std_response: f64,
    pub user_avg_status: f64,
    pub user_error_rate: f64,
    pub response_deviation: f64,
    pub response_zscore: f64,
    pub global_response_zscore: f64,
    pub requests_in_hour: usize,
    pub is_error: u8,
    pub user_error_deviation: f64,
    pub is_off_hours: u8,
    pub slow_response: u8,
}

impl FeatureVector {
    /// Model input, ordered as [`FEATURE_NAMES`].
    pub fn to_array(&self) -> [f64; FEATURE_DIM] {
        [
            self.response_time,
            f64::from(self.status_code),
            f64::from(self.hour),
            f64::from(self.minute_of_day),
            self.user_request_count as f64,
            self.user_avg_response,
            self.user_std_response,
            self.user_avg_status,
            self.user_error_rate,
            self.response_deviation,
            self.response_zscore,
            self.global_response_zscore,
            self.requests_in_hour as f64,
            self.user_error_deviation,
            f64::from(self.is_off_hours),
            f64::from(self.slow_response),
        ]
    }
}

/// One [`FeatureVector`] per input event, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    rows: Vec<FeatureVector>,
    /// Batch-level response time statistics the per-row flags were computed from
    pub batch_mean_response: f64,
    pub batch_std_response: f64,
}

impl FeatureTable {
    pub fn new(rows: Vec<FeatureVector>, batch_mean_response: f64, batch_std_response: f64) -> Self {
        Self {
            rows,
            batch_mean_response,
            batch_std_response,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<FeatureVector> {
        self.rows
    }

    /// Rows whose time features fell back to row position.
    pub fn fallback_timestamps(&self) -> usize {
        self.rows.iter().filter(|r| !r.timestamp_parsed).count()
    }

    /// `[len, FEATURE_DIM]` matrix for the scorer.
    pub fn to_matrix(&self) -> Array2<f64> {
        let mut m = Array2::zeros((self.rows.len(), FEATURE_DIM));
        for (mut out, fv) in m.outer_iter_mut().zip(&self.rows) {
            for (dst, src) in out.iter_mut().zip(fv.to_array()) {
                *dst = src;
            }
        }
        m
    }

    /// SHA-256 over the matrix bits (row-major, little endian). Equal digests mean the
    /// scorer saw identical input.
    pub fn digest(&self) -> String {
        let mut h = Sha256::new();
        for fv in &self.rows {
            for v in fv.to_array() {
                h.update(v.to_le_bytes());
            }
        }
        format!("{:x}", h.finalize())
    }
}
