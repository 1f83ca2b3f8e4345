//! Engine configuration
use crate::error::StatrunError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Operational ceiling on concurrent computations.
pub const DEFAULT_MAX_WORKERS: usize = 4;

pub const DEFAULT_RESULTS_ROOT: &str = "results_cache";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root of the per-dataset results cache
    pub results_root: PathBuf,

    /// Concurrent computations per `handle()` call
    pub max_workers: usize,

    /// Per-unit time limit; `None` waits for every unit
    pub unit_timeout_ms: Option<u64>,
}

impl EngineConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, StatrunError> {
        serde_yaml::from_str(yaml).map_err(|e| StatrunError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StatrunError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StatrunError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&text)
    }

    pub fn with_results_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.results_root = root.into();
        self
    }

    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self
    }

    pub fn with_unit_timeout(mut self, timeout: Duration) -> Self {
        self.unit_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Worker count, never below one.
    pub fn workers(&self) -> usize {
        self.max_workers.max(1)
    }

    pub fn unit_timeout(&self) -> Option<Duration> {
        self.unit_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            results_root: PathBuf::from(DEFAULT_RESULTS_ROOT),
            max_workers: DEFAULT_MAX_WORKERS,
            unit_timeout_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.results_root, PathBuf::from("results_cache"));
        assert_eq!(config.workers(), 4);
        assert_eq!(config.unit_timeout(), None);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EngineConfig::from_yaml("unit_timeout_ms: 1500\n").unwrap();
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.unit_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_zero_workers_clamped() {
        let config = EngineConfig::from_yaml("max_workers: 0").unwrap();
        assert_eq!(config.workers(), 1);
    }

    #[test]
    fn test_bad_yaml_is_config_error() {
        let err = EngineConfig::from_yaml("max_workers: many").unwrap_err();
        assert!(matches!(err, StatrunError::Config(_)));
    }
}
