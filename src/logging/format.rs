//! JSON log lines: one JSON object per line (ndjson) for ingestion and audit.

use crate::config::LogConfig;
use crate::report::ScoredEvent;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// One flagged event as an ndjson line.
#[derive(Debug, Serialize)]
pub struct AnomalyLine<'a> {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<&'a str>,
    pub user: &'a str,
    pub status_code: u16,
    pub response_time: f64,
    pub score: f64,
    pub label: &'static str,
    pub response_zscore: f64,
    pub global_response_zscore: f64,
}

impl<'a> From<&'a ScoredEvent> for AnomalyLine<'a> {
    fn from(s: &'a ScoredEvent) -> Self {
        Self {
            row: s.row,
            timestamp: s.event.timestamp.as_deref(),
            user: &s.event.user,
            status_code: s.event.status_code,
            response_time: s.event.response_time,
            score: s.score,
            label: s.label.as_str(),
            response_zscore: s.features.response_zscore,
            global_response_zscore: s.features.global_response_zscore,
        }
    }
}

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install the global subscriber on stderr; stdout is reserved for the summary
    /// and anomaly lines. `RUST_LOG` wins over `config.level`, and an unusable level
    /// falls back to `info`. Fails if a subscriber is already installed.
    pub fn init(config: &LogConfig) -> Result<(), TryInitError> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        // json: one flat object per event so it can be mixed into the same log store
        // as the ndjson anomaly lines
        let layer: Box<dyn Layer<Registry> + Send + Sync> = if config.json {
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr)
                .boxed()
        };
        tracing_subscriber::registry().with(layer).with(filter).try_init()
    }

    /// Emit a single structured line without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        let line = serde_json::to_string(event).map_err(std::io::Error::other)?;
        writeln!(w, "{line}")
    }
}
