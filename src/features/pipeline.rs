//! Feature derivation: events → time of day + per-user baselines → one vector per event.

use super::{
    mean, sample_std, FeatureTable, FeatureVector, TimeOfDay, UserProfile,
    ERROR_STATUS_THRESHOLD, OFF_HOURS, SLOW_RESPONSE_SIGMA,
};
use crate::events::EventBatch;
use std::collections::HashMap;

/// Stateless: every call sees only the batch it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureDeriver;

impl FeatureDeriver {
    pub fn derive(batch: &EventBatch) -> FeatureTable {
        let events = batch.events();
        let times: Vec<TimeOfDay> = events
            .iter()
            .enumerate()
            .map(|(i, e)| TimeOfDay::for_row(e.timestamp.as_deref(), i))
            .collect();

        // Group rows by user in first-appearance order.
        let mut group_of: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut row_group = Vec::with_capacity(events.len());
        for (i, e) in events.iter().enumerate() {
            let g = *group_of.entry(e.user.as_str()).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[g].push(i);
            row_group.push(g);
        }
        let profiles: Vec<UserProfile> = groups
            .iter()
            .map(|rows| UserProfile::from_rows(events, rows))
            .collect();

        let mut per_hour: HashMap<(usize, u32), usize> = HashMap::new();
        for (g, t) in row_group.iter().zip(&times) {
            *per_hour.entry((*g, t.hour)).or_default() += 1;
        }

        let responses: Vec<f64> = events.iter().map(|e| e.response_time).collect();
        let batch_mean = mean(&responses);
        let batch_std = sample_std(&responses);
        let slow_cutoff = batch_mean + SLOW_RESPONSE_SIGMA * batch_std;

        let rows = events
            .iter()
            .zip(&times)
            .zip(&row_group)
            .map(|((e, t), &g)| {
                let p = &profiles[g];
                let response_deviation = (e.response_time - p.avg_response).abs();
                let is_error = u8::from(e.status_code >= ERROR_STATUS_THRESHOLD);
                FeatureVector {
                    response_time: e.response_time,
                    status_code: e.status_code,
                    hour: t.hour,
                    minute_of_day: t.minute_of_day,
                    timestamp_parsed: t.parsed,
                    user_request_count: p.request_count,
                    user_avg_response: p.avg_response,
                    user_std_response: p.std_response,
                    user_avg_status: p.avg_status,
                    user_error_rate: p.error_rate,
                    response_deviation,
                    response_zscore: if p.std_response > 0.0 {
                        response_deviation / p.std_response
                    } else {
                        0.0
                    },
                    global_response_zscore: if batch_std > 0.0 {
                        (e.response_time - batch_mean) / batch_std
                    } else {
                        0.0
                    },
                    requests_in_hour: per_hour.get(&(g, t.hour)).copied().unwrap_or(0),
                    is_error,
                    user_error_deviation: (f64::from(is_error) - p.error_rate).abs(),
                    is_off_hours: u8::from(OFF_HOURS.contains(&t.hour)),
                    slow_response: u8::from(e.response_time > slow_cutoff),
                }
            })
            .collect();

        let table = FeatureTable::new(rows, batch_mean, batch_std);
        let fallback = table.fallback_timestamps();
        if fallback > 0 {
            tracing::warn!(
                rows = fallback,
                total = table.len(),
                "timestamps missing or unparseable; using positional time features"
            );
        }
        tracing::debug!(
            rows = table.len(),
            users = profiles.len(),
            batch_mean,
            batch_std,
            "derived features"
        );
        table
    }
}
