//! Diff session configuration

use serde::{Deserialize, Serialize};

use super::errors::{DiffError, DiffResult};

/// Query diff configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Rows each side may prefetch ahead of the merge (default: 256)
    #[serde(default = "default_prefetch_capacity")]
    pub prefetch_capacity: usize,

    /// Prefix of the prefetch worker thread names (default: "querydiff")
    #[serde(default = "default_worker_name_prefix")]
    pub worker_name_prefix: String,
}

fn default_prefetch_capacity() -> usize {
    256
}

fn default_worker_name_prefix() -> String {
    "querydiff".to_string()
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            prefetch_capacity: default_prefetch_capacity(),
            worker_name_prefix: default_worker_name_prefix(),
        }
    }
}

impl DiffConfig {
    /// Create a config with the given prefetch capacity
    pub fn with_prefetch_capacity(prefetch_capacity: usize) -> Self {
        Self {
            prefetch_capacity,
            ..Default::default()
        }
    }

    /// Parses and validates a JSON config; missing keys take defaults
    pub fn from_json_str(json: &str) -> DiffResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| DiffError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values are usable
    pub fn validate(&self) -> DiffResult<()> {
        if self.prefetch_capacity == 0 {
            return Err(DiffError::Config(
                "prefetch_capacity must be at least 1".into(),
            ));
        }
        if self.worker_name_prefix.trim().is_empty() {
            return Err(DiffError::Config(
                "worker_name_prefix must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Thread name of the prefetch worker for `side`
    pub fn worker_name(&self, side: impl std::fmt::Display) -> String {
        format!("{}-{}", self.worker_name_prefix, side)
    }
}
