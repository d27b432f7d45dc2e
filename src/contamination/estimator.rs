use super::{
    CONTAMINATION_CEILING, CONTAMINATION_FLOOR, SERVER_ERROR_STATUS_THRESHOLD,
    ZSCORE_SUSPECT_THRESHOLD,
};
use crate::features::{FeatureTable, FeatureVector};

/// Server error, slow response, or a large per-user z-score.
pub fn is_suspect(fv: &FeatureVector) -> bool {
    fv.status_code >= SERVER_ERROR_STATUS_THRESHOLD
        || fv.slow_response == 1
        || fv.response_zscore > ZSCORE_SUSPECT_THRESHOLD
}

/// Fraction of suspect rows clamped to `[0.05, 0.5]`.
pub fn estimate(features: &FeatureTable) -> f64 {
    if features.is_empty() {
        return CONTAMINATION_FLOOR;
    }
    let suspects = features.rows().iter().filter(|fv| is_suspect(fv)).count();
    let raw = suspects as f64 / features.len() as f64;
    let fraction = raw.clamp(CONTAMINATION_FLOOR, CONTAMINATION_CEILING);
    tracing::debug!(suspects, rows = features.len(), raw, fraction, "estimated contamination");
    fraction
}
