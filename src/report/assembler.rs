//! Joins verdicts back onto events and computes batch summary statistics.

use crate::error::{AnalysisError, Result};
use crate::events::{Event, EventBatch};
use crate::features::{FeatureTable, FeatureVector};
use crate::model::{Label, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An event with everything the decision was based on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEvent {
    /// Position in the input batch
    pub row: usize,
    pub event: Event,
    pub features: FeatureVector,
    pub label: Label,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelFilter {
    #[default]
    All,
    Anomalous,
    Normal,
}

impl LabelFilter {
    pub fn matches(self, label: Label) -> bool {
        match self {
            LabelFilter::All => true,
            LabelFilter::Anomalous => label == Label::Anomalous,
            LabelFilter::Normal => label == Label::Normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Every event, input order
    pub scored: Vec<ScoredEvent>,
    /// Anomalous subset, input order
    pub anomalies: Vec<ScoredEvent>,
    pub total: usize,
    pub normal_count: usize,
    pub anomalous_count: usize,
    /// `anomalous_count / total`, 0 for an empty result
    pub anomaly_rate: f64,
    pub status_code_histogram: BTreeMap<u16, usize>,
    /// Outlier fraction the decision threshold was placed at
    pub contamination: f64,
    /// SHA-256 of the feature matrix
    pub feature_digest: String,
}

impl AnalysisResult {
    pub fn filter(&self, filter: LabelFilter) -> impl Iterator<Item = &ScoredEvent> + '_ {
        self.scored.iter().filter(move |s| filter.matches(s.label))
    }

    pub fn labels(&self) -> Vec<Label> {
        self.scored.iter().map(|s| s.label).collect()
    }
}

pub fn assemble(
    batch: &EventBatch,
    features: FeatureTable,
    verdicts: Vec<Verdict>,
    contamination: f64,
) -> Result<AnalysisResult> {
    if features.len() != batch.len() || verdicts.len() != batch.len() {
        return Err(AnalysisError::FeatureComputation(format!(
            "row count mismatch: {} events, {} feature rows, {} verdicts",
            batch.len(),
            features.len(),
            verdicts.len()
        )));
    }
    let feature_digest = features.digest();

    let scored: Vec<ScoredEvent> = batch
        .iter()
        .zip(features.into_rows())
        .zip(verdicts)
        .enumerate()
        .map(|(row, ((event, features), verdict))| ScoredEvent {
            row,
            event: event.clone(),
            features,
            label: verdict.label,
            score: verdict.score,
        })
        .collect();

    let anomalies: Vec<ScoredEvent> = scored
        .iter()
        .filter(|s| s.label == Label::Anomalous)
        .cloned()
        .collect();

    let mut status_code_histogram = BTreeMap::new();
    for e in batch {
        *status_code_histogram.entry(e.status_code).or_insert(0) += 1;
    }

    let total = scored.len();
    let anomalous_count = anomalies.len();
    let anomaly_rate = if total == 0 {
        0.0
    } else {
        anomalous_count as f64 / total as f64
    };

    Ok(AnalysisResult {
        scored,
        anomalies,
        total,
        normal_count: total - anomalous_count,
        anomalous_count,
        anomaly_rate,
        status_code_histogram,
        contamination,
        feature_digest,
    })
}
