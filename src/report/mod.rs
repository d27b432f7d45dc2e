//! Analysis results: per-event decisions, summary counts, exports.

mod assembler;
pub mod export;

pub use assembler::{assemble, AnalysisResult, LabelFilter, ScoredEvent};
pub use export::{export, ExportFormat};
