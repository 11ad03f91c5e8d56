use scrub_config::load_config;
use scrub_config::shared::RunnerConfig;

use crate::error::RunnerResult;

/// Loads and validates the runner configuration.
pub fn load_runner_config() -> RunnerResult<RunnerConfig> {
    let config = load_config::<RunnerConfig>()?;
    config.validate()?;

    Ok(config)
}
