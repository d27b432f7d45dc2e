//! Batch-local anomaly labelling: fit a forest on the batch, score the same batch,
//! cut at the contamination quantile.

use super::IsolationForest;
use crate::config::ModelConfig;
use crate::error::{AnalysisError, Result};
use crate::features::{FeatureTable, FEATURE_NAMES};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Normal,
    Anomalous,
}

impl Label {
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score > threshold {
            Label::Anomalous
        } else {
            Label::Normal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Normal => "normal",
            Label::Anomalous => "anomalous",
        }
    }
}

/// Decision for one row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Label,
    /// Isolation score in (0, 1]; 0 when no model was fitted
    pub score: f64,
}

pub struct AnomalyScorer {
    config: ModelConfig,
}

impl AnomalyScorer {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// One verdict per feature row, same order. With fewer than two rows there is
    /// nothing to partition and every row is Normal.
    pub fn score(&self, features: &FeatureTable, contamination: f64) -> Result<Vec<Verdict>> {
        if !(contamination > 0.0 && contamination <= 0.5) {
            return Err(AnalysisError::FeatureComputation(format!(
                "contamination must be in (0, 0.5], got {contamination}"
            )));
        }
        if features.len() < 2 {
            tracing::debug!(rows = features.len(), "too few rows to fit; labelling all normal");
            return Ok(vec![
                Verdict {
                    label: Label::Normal,
                    score: 0.0,
                };
                features.len()
            ]);
        }

        let matrix = features.to_matrix();
        if let Some(((row, col), v)) = matrix.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(AnalysisError::FeatureComputation(format!(
                "non-finite `{}` ({v}) at row {row}",
                FEATURE_NAMES[col]
            )));
        }

        let forest = IsolationForest::fit(matrix.view(), &self.config);
        let scores = forest.score_all(matrix.view());
        let threshold = decision_threshold(&scores, contamination);
        tracing::debug!(
            trees = forest.n_trees(),
            contamination,
            threshold,
            "fitted isolation forest"
        );

        Ok(scores
            .into_iter()
            .map(|score| Verdict {
                label: Label::from_score(score, threshold),
                score,
            })
            .collect())
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

/// Linear-interpolated `(1 - contamination)` quantile of the scores; rows strictly
/// above it are anomalous.
pub fn decision_threshold(scores: &[f64], contamination: f64) -> f64 {
    if scores.is_empty() {
        return f64::INFINITY;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = (1.0 - contamination) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
