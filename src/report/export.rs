//! Downloadable artifacts: scored rows as CSV, or the whole result as JSON.

use super::{AnalysisResult, ScoredEvent};
use crate::error::IoError;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            _ => Err(IoError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Flat CSV row: input columns, derived features, then the decision.
#[derive(Debug, Serialize)]
struct ScoredRow<'a> {
    row: usize,
    timestamp: Option<&'a str>,
    response_time: f64,
    status_code: u16,
    user: &'a str,
    hour: u32,
    minute_of_day: u32,
    timestamp_parsed: bool,
    user_request_count: usize,
    user_avg_response: f64,
    user_std_response: f64,
    user_avg_status: f64,
    user_error_rate: f64,
    response_deviation: f64,
    response_zscore: f64,
    global_response_zscore: f64,
    requests_in_hour: usize,
    is_error: u8,
    user_error_deviation: f64,
    is_off_hours: u8,
    slow_response: u8,
    label: &'static str,
    score: f64,
}

impl<'a> From<&'a ScoredEvent> for ScoredRow<'a> {
    fn from(s: &'a ScoredEvent) -> Self {
        let f = &s.features;
        Self {
            row: s.row,
            timestamp: s.event.timestamp.as_deref(),
            response_time: s.event.response_time,
            status_code: s.event.status_code,
            user: &s.event.user,
            hour: f.hour,
            minute_of_day: f.minute_of_day,
            timestamp_parsed: f.timestamp_parsed,
            user_request_count: f.user_request_count,
            user_avg_response: f.user_avg_response,
            user_std_response: f.user_std_response,
            user_avg_status: f.user_avg_status,
            user_error_rate: f.user_error_rate,
            response_deviation: f.response_deviation,
            response_zscore: f.response_zscore,
            global_response_zscore: f.global_response_zscore,
            requests_in_hour: f.requests_in_hour,
            is_error: f.is_error,
            user_error_deviation: f.user_error_deviation,
            is_off_hours: f.is_off_hours,
            slow_response: f.slow_response,
            label: s.label.as_str(),
            score: s.score,
        }
    }
}

pub fn write_csv<'a, W: Write>(
    w: W,
    rows: impl IntoIterator<Item = &'a ScoredEvent>,
) -> Result<(), IoError> {
    let mut writer = csv::Writer::from_writer(w);
    for s in rows {
        writer.serialize(ScoredRow::from(s))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(w: W, result: &AnalysisResult) -> Result<(), IoError> {
    serde_json::to_writer_pretty(w, result)?;
    Ok(())
}

/// Write `result` to `path`; format from `format` or the file extension.
pub fn export(path: &Path, result: &AnalysisResult, format: Option<ExportFormat>) -> Result<(), IoError> {
    let format = match format {
        Some(f) => f,
        None => ExportFormat::from_path(path)?,
    };
    let mut w = BufWriter::new(File::create(path)?);
    match format {
        ExportFormat::Csv => write_csv(&mut w, &result.scored)?,
        ExportFormat::Json => write_json(&mut w, result)?,
    }
    w.flush()?;
    tracing::info!(path = %path.display(), ?format, rows = result.total, "exported analysis");
    Ok(())
}
