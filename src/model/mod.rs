//! Unsupervised anomaly model: seeded isolation forest plus the labelling rule.

mod forest;
mod scorer;

pub use forest::{average_path_length, IsolationForest};
pub use scorer::{decision_threshold, AnomalyScorer, Label, Verdict};
