//! File adapters: CSV / JSON / ndjson event logs in, generated logs out.

use super::{Event, RawEvent};
use crate::error::IoError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFormat {
    /// Header row naming `timestamp,response_time,status_code,user`; extra columns ignored
    Csv,
    /// A single JSON array of objects
    Json,
    /// One JSON object per line
    Ndjson,
}

impl EventFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            _ => Err(IoError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Read rows without interpreting them; validation happens in [`super::EventBatch::from_raw`].
pub fn read_events(path: &Path, format: Option<EventFormat>) -> Result<Vec<RawEvent>, IoError> {
    let format = match format {
        Some(f) => f,
        None => EventFormat::from_path(path)?,
    };
    let file = File::open(path)?;
    let rows = match format {
        EventFormat::Csv => {
            let mut reader = csv::Reader::from_reader(file);
            reader
                .deserialize::<RawEvent>()
                .collect::<Result<Vec<_>, _>>()?
        }
        EventFormat::Json => serde_json::from_reader(BufReader::new(file))?,
        EventFormat::Ndjson => {
            let mut out = Vec::new();
            for line in BufReader::new(file).lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                out.push(serde_json::from_str(&line)?);
            }
            out
        }
    };
    tracing::debug!(path = %path.display(), rows = rows.len(), ?format, "read event file");
    Ok(rows)
}

/// Write events in the given format (used by the sample generator).
pub fn write_events(path: &Path, events: &[Event], format: EventFormat) -> Result<(), IoError> {
    let file = File::create(path)?;
    match format {
        EventFormat::Csv => {
            let mut writer = csv::Writer::from_writer(file);
            for e in events {
                writer.serialize(e)?;
            }
            writer.flush()?;
        }
        EventFormat::Json => serde_json::to_writer_pretty(BufWriter::new(file), events)?,
        EventFormat::Ndjson => {
            let mut w = BufWriter::new(file);
            for e in events {
                serde_json::to_writer(&mut w, e)?;
                writeln!(w)?;
            }
            w.flush()?;
        }
    }
    Ok(())
}
