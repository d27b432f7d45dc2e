//! The one operation callers need: raw rows in, labelled batch out.
//!
//! `Analyzer` holds configuration only. Every call owns its batch, feature table
//! and forest, so one instance can serve concurrent callers.

use crate::config::ModelConfig;
use crate::contamination;
use crate::error::Result;
use crate::events::{EventBatch, RawEvent};
use crate::features::FeatureDeriver;
use crate::model::AnomalyScorer;
use crate::report::{assemble, AnalysisResult};
use tracing::info;

pub struct Analyzer {
    scorer: AnomalyScorer,
}

impl Analyzer {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            scorer: AnomalyScorer::new(config),
        }
    }

    /// Validate, derive, estimate, score, assemble. Fails before any derivation on an
    /// empty batch or a malformed row.
    pub fn analyze(&self, raw: &[RawEvent]) -> Result<AnalysisResult> {
        let batch = EventBatch::from_raw(raw)?;
        self.analyze_batch(&batch)
    }

    pub fn analyze_batch(&self, batch: &EventBatch) -> Result<AnalysisResult> {
        let features = FeatureDeriver::derive(batch);
        let contamination = contamination::estimate(&features);
        let verdicts = self.scorer.score(&features, contamination)?;
        let result = assemble(batch, features, verdicts, contamination)?;
        info!(
            total = result.total,
            anomalous = result.anomalous_count,
            anomaly_rate = result.anomaly_rate,
            contamination,
            "analysis complete"
        );
        Ok(result)
    }

    pub fn model_config(&self) -> &ModelConfig {
        self.scorer.config()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

/// [`Analyzer::analyze`] with default model settings.
pub fn analyze(raw: &[RawEvent]) -> Result<AnalysisResult> {
    Analyzer::default().analyze(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::events::Event;
    use crate::model::Label;

    fn raw_rows(events: &[Event]) -> Vec<RawEvent> {
        events.iter().map(RawEvent::from).collect()
    }

    #[test]
    fn empty_input_fails_before_derivation() {
        assert!(matches!(analyze(&[]), Err(AnalysisError::EmptyBatch)));
    }

    #[test]
    fn single_event_is_normal() {
        let r = analyze(&raw_rows(&[Event::new(Some("2024-01-01 02:00:00"), 9_000.0, 503, "a")])).unwrap();
        assert_eq!(r.labels(), vec![Label::Normal]);
        assert_eq!(r.anomaly_rate, 0.0);
        assert_eq!(r.total, 1);
    }

    #[test]
    fn analyzer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Analyzer>();
    }
}
