use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::SqliteConnectionConfig;

const fn default_max_concurrent_fetches() -> u16 {
    8
}

/// Validation failures for pipeline configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("max_concurrent_fetches must be greater than zero")]
    MaxConcurrentFetchesZero,
}

/// Configuration for one scrub pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Unique identifier for this pipeline, used for log correlation.
    pub id: u64,
    /// Connection configuration of the SQLite source database.
    pub source: SqliteConnectionConfig,
    /// Artificial delay, in milliseconds, applied at the start of every
    /// partition fetch to simulate a slow connection. Zero disables it.
    #[serde(default)]
    pub fetch_latency_ms: u64,
    /// Upper bound, in milliseconds, on a single partition fetch. Unbounded
    /// when absent.
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,
    /// Maximum number of partition fetches in flight at once.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: u16,
}

impl PipelineConfig {
    /// Validates pipeline configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_concurrent_fetches == 0 {
            return Err(ValidationError::MaxConcurrentFetchesZero);
        }

        Ok(())
    }
}
