//! Synthetic request logs for demos and benchmarks: mostly fast 2xx traffic with a
//! tail of slow 5xx failures.

use super::Event;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const OK_CODES: [u16; 4] = [200, 201, 202, 204];
const FAIL_CODES: [u16; 4] = [500, 502, 503, 504];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub count: usize,
    /// Fraction of rows (at the end of the batch) drawn from the failure profile
    pub anomaly_fraction: f64,
    pub users: u32,
    pub seed: u64,
    /// Timestamps fall in the 24h before this instant
    pub now: DateTime<Utc>,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            count: 1000,
            anomaly_fraction: 0.1,
            users: 100,
            seed: 42,
            now: Utc::now(),
        }
    }
}

pub fn generate(spec: &SampleSpec) -> Vec<Event> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = spec.count - (spec.count as f64 * spec.anomaly_fraction.clamp(0.0, 1.0)) as usize;
    let users = spec.users.max(1);

    (0..spec.count)
        .map(|i| {
            let ts = spec.now - Duration::minutes(rng.gen_range(0..=1440));
            let id = rng.gen_range(1..=users);
            // failing traffic comes from its own accounts (`user7`, not `user_7`)
            let (response_time, codes, user) = if i < normal {
                (rng.gen_range(50..=500), &OK_CODES, format!("user_{id}"))
            } else {
                (rng.gen_range(500..=10_000), &FAIL_CODES, format!("user{id}"))
            };
            let status = *codes.choose(&mut rng).unwrap_or(&codes[0]);
            Event::new(
                Some(ts.format(TIMESTAMP_FORMAT).to_string()),
                f64::from(response_time),
                status,
                user,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn spec() -> SampleSpec {
        SampleSpec {
            now: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            ..SampleSpec::default()
        }
    }

    #[test]
    fn tail_is_slow_and_failing() {
        let events = generate(&spec());
        assert_eq!(events.len(), 1000);
        assert!(events[..900]
            .iter()
            .all(|e| e.status_code < 300 && e.response_time <= 500.0));
        assert!(events[900..]
            .iter()
            .all(|e| e.status_code >= 500 && e.response_time >= 500.0));
    }

    #[test]
    fn failing_accounts_send_no_normal_traffic() {
        let events = generate(&spec());
        let normal: std::collections::HashSet<&str> =
            events[..900].iter().map(|e| e.user.as_str()).collect();
        assert!(events[900..].iter().all(|e| !normal.contains(e.user.as_str())));
    }

    #[test]
    fn same_seed_same_logs() {
        assert_eq!(generate(&spec()), generate(&spec()));
    }
}
