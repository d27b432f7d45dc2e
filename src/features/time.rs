//! Time-of-day extraction with a positional fallback for unusable timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute_of_day: u32,
    pub parsed: bool,
}

impl TimeOfDay {
    /// Hour/minute from the timestamp, or `index % 24` / `index % 1440` when it is
    /// absent or unparseable.
    pub fn for_row(timestamp: Option<&str>, index: usize) -> Self {
        match timestamp.and_then(parse_timestamp) {
            Some(dt) => Self {
                hour: dt.hour(),
                minute_of_day: dt.hour() * 60 + dt.minute(),
                parsed: true,
            },
            None => Self {
                hour: (index % 24) as u32,
                minute_of_day: (index % 1440) as u32,
                parsed: false,
            },
        }
    }
}

/// Wall-clock time as written; an RFC 3339 offset is not converted to UTC.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
