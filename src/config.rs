//! Analyzer configuration. Detection heuristics are constants in [`crate::features`];
//! only model shape, ingestion limits and logging are configurable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable pointing at a JSON config file.
pub const CONFIG_PATH_ENV: &str = "LOGSENTRY_CONFIG_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Isolation forest parameters
    pub model: ModelConfig,
    /// Limits applied by the ingestion adapter before calling the core
    pub ingest: IngestConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of isolation trees in the ensemble
    pub n_trees: usize,
    /// Sub-sample drawn (without replacement) per tree; capped at batch size
    pub max_samples: usize,
    /// Seed for tree construction. Same seed + same batch => same labels.
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Largest batch the CLI will hand to the analyzer
    pub max_events: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            seed: 42,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_events: 100_000,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<AppConfig>(&data) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "invalid config; using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable config; using defaults");
                Self::default()
            }
        }
    }

    /// `$LOGSENTRY_CONFIG_PATH`, then `./config.json`, then the per-user config dir.
    pub fn resolve_path() -> PathBuf {
        if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(p);
        }
        let local = PathBuf::from("config.json");
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .map(|d| d.join("logsentry").join("config.json"))
            .unwrap_or(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"model": {{"n_trees": 50}}}}"#).unwrap();
        let c = AppConfig::load(f.path());
        assert_eq!(c.model.n_trees, 50);
        assert_eq!(c.model.seed, 42);
        assert_eq!(c.ingest.max_events, 100_000);
        assert_eq!(c.log.level, "info");
    }

    #[test]
    fn garbage_file_falls_back_to_default() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        let c = AppConfig::load(f.path());
        assert_eq!(c.model.max_samples, 256);
    }
}
