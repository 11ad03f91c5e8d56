use serde::{Deserialize, Serialize};

use crate::shared::{PipelineConfig, ValidationError};

/// Top-level configuration of the runner service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// The pipeline to run.
    pub pipeline: PipelineConfig,
}

impl RunnerConfig {
    /// Validates the full runner configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.pipeline.validate()
    }
}
