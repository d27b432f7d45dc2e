//! logsentry — batch anomaly detection for structured request logs.
//!
//! Modular structure:
//! - [`events`] — Raw and validated log events, file ingestion, sample generator
//! - [`features`] — Per-event and per-user statistical feature derivation
//! - [`contamination`] — Expected outlier fraction estimate
//! - [`model`] — Seeded isolation forest and labelling rule
//! - [`report`] — Result assembly, summary statistics, CSV/JSON export
//! - [`analyzer`] — End-to-end `analyze` operation
//! - [`logging`] — Structured JSON logging

pub mod analyzer;
pub mod config;
pub mod contamination;
pub mod error;
pub mod events;
pub mod features;
pub mod logging;
pub mod model;
pub mod report;

pub use analyzer::{analyze, Analyzer};
pub use config::AppConfig;
pub use error::{AnalysisError, IoError};
pub use events::{Event, EventBatch, RawEvent};
pub use features::{FeatureDeriver, FeatureTable, FeatureVector};
pub use logging::StructuredLogger;
pub use model::{AnomalyScorer, Label};
pub use report::{AnalysisResult, ScoredEvent};
