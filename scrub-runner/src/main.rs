//! Scrub runner service binary.
//!
//! Loads configuration, initializes tracing, starts the async runtime, and
//! runs the fetch-filter-persist pipeline once, reporting the outcome.

use scrub_config::shared::RunnerConfig;
use scrub_telemetry::tracing::init_tracing;
use tracing::error;

use crate::config::load_runner_config;
use crate::core::start_pipeline_with_config;
use crate::error::{RunnerError, RunnerResult};

mod config;
mod core;
mod error;

/// Entry point for the runner service.
///
/// Configuration is loaded before the runtime starts so that a broken config
/// fails fast without touching the database.
fn main() -> RunnerResult<()> {
    let runner_config = load_runner_config()?;

    init_tracing(env!("CARGO_BIN_NAME"))
        .map_err(|err| RunnerError::Io(std::io::Error::other(err)))?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(runner_config))?;

    Ok(())
}

async fn async_main(runner_config: RunnerConfig) -> RunnerResult<()> {
    if let Err(err) = start_pipeline_with_config(runner_config).await {
        error!("{err}");
        return Err(err);
    }

    Ok(())
}
