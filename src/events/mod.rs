//! Request log events: loosely typed rows from ingestion, validated into an
//! ordered [`EventBatch`] the rest of the pipeline can trust.

mod ingest;
pub mod sample;

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use ingest::{read_events, write_events, EventFormat};

/// Row as delivered by an ingestion adapter (uploaded file, generator, API caller).
/// Field types are not trusted until [`EventBatch::from_raw`] has checked them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub response_time: Option<Value>,
    #[serde(default)]
    pub status_code: Option<Value>,
    #[serde(default)]
    pub user: Option<Value>,
}

/// One validated log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Kept as text; parsing (and the positional fallback) belongs to feature derivation.
    pub timestamp: Option<String>,
    /// Milliseconds, finite and non-negative
    pub response_time: f64,
    pub status_code: u16,
    pub user: String,
}

impl Event {
    pub fn new(
        timestamp: Option<impl Into<String>>,
        response_time: f64,
        status_code: u16,
        user: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.map(Into::into),
            response_time,
            status_code,
            user: user.into(),
        }
    }
}

impl From<&Event> for RawEvent {
    fn from(e: &Event) -> Self {
        Self {
            timestamp: e.timestamp.clone().map(Value::String),
            response_time: serde_json::Number::from_f64(e.response_time).map(Value::Number),
            status_code: Some(Value::from(e.status_code)),
            user: Some(Value::String(e.user.clone())),
        }
    }
}

/// Non-empty, ordered, validated sequence of events.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBatch {
    events: Vec<Event>,
}

impl EventBatch {
    /// Validate typed events. Rejects an empty batch and out-of-range values;
    /// user names are trimmed the same way [`EventBatch::from_raw`] trims them.
    pub fn new(mut events: Vec<Event>) -> Result<Self> {
        if events.is_empty() {
            return Err(AnalysisError::EmptyBatch);
        }
        for (row, e) in events.iter_mut().enumerate() {
            check_response_time(row, e.response_time)?;
            check_status_code(row, u64::from(e.status_code))?;
            e.user = check_user(row, &e.user)?;
        }
        Ok(Self { events })
    }

    /// Validate loosely typed rows. Nothing is dropped: the first bad row fails the batch.
    pub fn from_raw(raw: &[RawEvent]) -> Result<Self> {
        if raw.is_empty() {
            return Err(AnalysisError::EmptyBatch);
        }
        let events = raw
            .iter()
            .enumerate()
            .map(|(row, r)| validate_row(row, r))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false for a constructed batch; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl<'a> IntoIterator for &'a EventBatch {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

fn malformed(row: usize, field: &'static str, reason: impl Into<String>) -> AnalysisError {
    AnalysisError::MalformedEvent {
        row,
        field,
        reason: reason.into(),
    }
}

fn check_response_time(row: usize, v: f64) -> Result<f64> {
    if !v.is_finite() {
        return Err(malformed(row, "response_time", "is not finite"));
    }
    if v < 0.0 {
        return Err(malformed(row, "response_time", format!("is negative ({v})")));
    }
    Ok(v)
}

fn check_status_code(row: usize, v: u64) -> Result<u16> {
    if !(100..=599).contains(&v) {
        return Err(malformed(
            row,
            "status_code",
            format!("is outside 100..=599 ({v})"),
        ));
    }
    Ok(v as u16)
}

fn check_user(row: usize, user: &str) -> Result<String> {
    let user = user.trim();
    if user.is_empty() {
        return Err(malformed(row, "user", "is empty"));
    }
    Ok(user.to_string())
}

/// Integral floats (`200.0`) are what spreadsheet and dataframe exports write for
/// integer columns that once held a null.
fn integral_status(n: &serde_json::Number) -> Option<u64> {
    n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}

fn validate_row(row: usize, r: &RawEvent) -> Result<Event> {
    let response_time = match &r.response_time {
        None | Some(Value::Null) => return Err(malformed(row, "response_time", "is missing")),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| malformed(row, "response_time", "is not representable as f64"))?,
        Some(other) => {
            return Err(malformed(
                row,
                "response_time",
                format!("expected a number, got {other}"),
            ))
        }
    };
    let response_time = check_response_time(row, response_time)?;

    let status_code = match &r.status_code {
        None | Some(Value::Null) => return Err(malformed(row, "status_code", "is missing")),
        Some(Value::Number(n)) => integral_status(n)
            .ok_or_else(|| malformed(row, "status_code", format!("expected an integer, got {n}")))?,
        Some(other) => {
            return Err(malformed(
                row,
                "status_code",
                format!("expected an integer, got {other}"),
            ))
        }
    };
    let status_code = check_status_code(row, status_code)?;

    let user = match &r.user {
        None | Some(Value::Null) => return Err(malformed(row, "user", "is missing")),
        Some(Value::String(s)) => check_user(row, s)?,
        // numeric ids survive CSV type inference
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(malformed(
                row,
                "user",
                format!("expected a string, got {other}"),
            ))
        }
    };

    let timestamp = match &r.timestamp {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    Ok(Event {
        timestamp,
        response_time,
        status_code,
        user,
    })
}
