use scrub::error::ScrubError;
use scrub_config::LoadConfigError;
use scrub_config::shared::ValidationError;
use thiserror::Error;

/// Result type for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Error type for the runner service.
///
/// Wraps [`ScrubError`] for pipeline errors and provides variants for
/// infrastructure errors around it.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Pipeline error.
    #[error(transparent)]
    Scrub(#[from] ScrubError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] LoadConfigError),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    /// I/O error outside the pipeline.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
