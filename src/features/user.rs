//! Per-user baselines over the whole batch.

use super::ERROR_STATUS_THRESHOLD;
use crate::events::Event;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub request_count: usize,
    pub avg_response: f64,
    /// Sample standard deviation; 0 for a user with a single event
    pub std_response: f64,
    pub avg_status: f64,
    /// Fraction of the user's events with status >= 400
    pub error_rate: f64,
}

impl UserProfile {
    /// `rows` are indices into `events` belonging to one user, in batch order.
    pub fn from_rows(events: &[Event], rows: &[usize]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let n = rows.len() as f64;
        let responses: Vec<f64> = rows.iter().map(|&i| events[i].response_time).collect();
        let status_sum: f64 = rows.iter().map(|&i| f64::from(events[i].status_code)).sum();
        let errors = rows
            .iter()
            .filter(|&&i| events[i].status_code >= ERROR_STATUS_THRESHOLD)
            .count();

        Self {
            request_count: rows.len(),
            avg_response: mean(&responses),
            std_response: sample_std(&responses),
            avg_status: status_sum / n,
            error_rate: errors as f64 / n,
        }
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample (n - 1) standard deviation, 0 for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}
