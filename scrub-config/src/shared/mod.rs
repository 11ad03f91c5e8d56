//! Shared configuration types for the scrub pipeline.

mod connection;
mod pipeline;
mod runner;

pub use connection::SqliteConnectionConfig;
pub use pipeline::{PipelineConfig, ValidationError};
pub use runner::RunnerConfig;
