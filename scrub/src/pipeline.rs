//! Pipeline orchestration: open, gather, clean, write, always close.

use std::sync::Arc;
use std::time::{Duration, Instant};

use scrub_config::shared::PipelineConfig;
use tracing::{error, info};

use crate::bail;
use crate::error::{ErrorKind, ScrubError, ScrubResult};
use crate::fetch::{FetchOptions, fetch_all_concurrent, fetch_all_sequential};
use crate::filter::clean_records;
use crate::store::base::RecordStore;

#[derive(Debug)]
enum PipelineState {
    NotStarted,
    Completed,
}

/// How the gather stage schedules its partition fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// All partitions fetched together, overlapping their I/O waits.
    Concurrent,
    /// One partition at a time; the reference path used as an equivalence
    /// oracle for the concurrent one.
    Sequential,
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Rows gathered from the source table before cleaning.
    pub rows_fetched: usize,
    /// Rows written to the clean table.
    pub clean_rows_written: u64,
    /// Wall time of the gather stage.
    pub gather_elapsed: Duration,
}

/// Orchestrates one scrub run against a [`RecordStore`].
///
/// Stage order is open, gather, clean, write, close. The central contract:
/// once the store opened, [`RecordStore::close`] runs on every exit path.
/// When a stage failure and a close failure are both in flight, the two are
/// aggregated so neither masks the other.
#[derive(Debug)]
pub struct Pipeline<S> {
    config: Arc<PipelineConfig>,
    store: S,
    state: PipelineState,
}

impl<S> Pipeline<S>
where
    S: RecordStore,
{
    pub fn new(config: PipelineConfig, store: S) -> Self {
        Self {
            config: Arc::new(config),
            store,
            state: PipelineState::NotStarted,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the pipeline with concurrent partition fetches.
    pub async fn run(&mut self) -> ScrubResult<PipelineReport> {
        self.run_with(FetchMode::Concurrent).await
    }

    /// Runs the pipeline with sequential partition fetches.
    pub async fn run_sequential(&mut self) -> ScrubResult<PipelineReport> {
        self.run_with(FetchMode::Sequential).await
    }

    async fn run_with(&mut self, mode: FetchMode) -> ScrubResult<PipelineReport> {
        if matches!(self.state, PipelineState::Completed) {
            bail!(ErrorKind::InvalidState, "pipeline has already run");
        }

        info!(
            pipeline_id = self.config.id,
            ?mode,
            "starting scrub pipeline"
        );

        // An open failure leaves nothing to clean up; the pipeline never
        // progressed past idle and may be retried.
        self.store.open().await?;
        self.state = PipelineState::Completed;

        let outcome = self.run_stages(mode).await;
        let cleanup = self.store.close().await;

        match (outcome, cleanup) {
            (Ok(report), Ok(())) => {
                info!(
                    pipeline_id = self.config.id,
                    clean_rows_written = report.clean_rows_written,
                    "scrub pipeline succeeded"
                );
                Ok(report)
            }
            (Err(stage), Ok(())) => {
                error!(pipeline_id = self.config.id, "scrub pipeline failed: {stage}");
                Err(stage)
            }
            (Ok(_), Err(cleanup)) => {
                error!(
                    pipeline_id = self.config.id,
                    "store cleanup failed after successful run: {cleanup}"
                );
                Err(cleanup)
            }
            (Err(stage), Err(cleanup)) => {
                error!(
                    pipeline_id = self.config.id,
                    "scrub pipeline failed and cleanup failed: {stage}; {cleanup}"
                );
                Err(ScrubError::from(vec![stage, cleanup]))
            }
        }
    }

    async fn run_stages(&self, mode: FetchMode) -> ScrubResult<PipelineReport> {
        let agents = self.store.agent_ids().await?;
        let options = self.fetch_options();

        let gather_started = Instant::now();
        let dirty = match mode {
            FetchMode::Concurrent => {
                fetch_all_concurrent(&self.store, &agents, &options).await?
            }
            FetchMode::Sequential => {
                fetch_all_sequential(&self.store, &agents, &options).await?
            }
        };
        let gather_elapsed = gather_started.elapsed();

        info!(
            rows = dirty.len(),
            partitions = agents.len(),
            elapsed_ms = gather_elapsed.as_millis() as u64,
            "gather complete"
        );

        let rows_fetched = dirty.len();
        let clean = clean_records(dirty);
        let clean_rows_written = self.store.write_clean(&clean).await?;

        Ok(PipelineReport {
            rows_fetched,
            clean_rows_written,
            gather_elapsed,
        })
    }

    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            latency: Duration::from_millis(self.config.fetch_latency_ms),
            timeout: self.config.fetch_timeout_ms.map(Duration::from_millis),
            max_concurrent_fetches: self.config.max_concurrent_fetches as usize,
        }
    }
}
