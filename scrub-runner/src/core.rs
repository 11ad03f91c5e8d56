use scrub::pipeline::{Pipeline, PipelineReport};
use scrub::store::sqlite::SqliteRecordStore;
use scrub_config::shared::RunnerConfig;
use tracing::info;

use crate::error::RunnerResult;

/// Runs the scrub pipeline described by the configuration.
///
/// Builds the SQLite record store, runs the concurrent pipeline against it,
/// and returns the report. Connection cleanup on failure paths is the
/// pipeline's responsibility, not handled here.
pub async fn start_pipeline_with_config(config: RunnerConfig) -> RunnerResult<PipelineReport> {
    info!(
        pipeline_id = config.pipeline.id,
        source = %config.pipeline.source.path.display(),
        "starting scrub runner"
    );

    let store = SqliteRecordStore::new(config.pipeline.source.clone());
    let mut pipeline = Pipeline::new(config.pipeline, store);

    let report = pipeline.run().await?;

    info!(
        rows_fetched = report.rows_fetched,
        clean_rows_written = report.clean_rows_written,
        gather_elapsed_ms = report.gather_elapsed.as_millis() as u64,
        "scrub runner finished"
    );

    Ok(report)
}
