//! Gathering of per-agent partitions, concurrent and sequential.

use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::{ErrorKind, ScrubResult};
use crate::scrub_error;
use crate::store::base::RecordStore;
use crate::types::{AgentId, SalesRecord};

/// Knobs for the gather stage.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Artificial wait applied at the start of every partition fetch,
    /// simulating a slow connection. Zero disables it.
    pub latency: Duration,
    /// Upper bound on a single partition fetch; exceeding it fails the
    /// gather with [`ErrorKind::FetchFailed`]. [`None`] means unbounded.
    pub timeout: Option<Duration>,
    /// Maximum number of partition fetches in flight at once.
    pub max_concurrent_fetches: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            timeout: None,
            max_concurrent_fetches: 8,
        }
    }
}

/// Fetches every agent partition concurrently and merges the results.
///
/// All fetches are issued together and awaited as one unit; the first
/// failure fails the whole gather and partial results are discarded. Each
/// fetch fills its own result vector, so the merge is a post-completion
/// flatten over disjoint buffers and needs no lock. A variant appending to
/// one shared buffer from parallel threads would need a mutex around it.
///
/// The merged order depends on partition order and completion, and is
/// deliberately unspecified; the multiset of records is complete and
/// duplicate-free because partitions are disjoint.
pub async fn fetch_all_concurrent<S>(
    store: &S,
    agents: &[AgentId],
    options: &FetchOptions,
) -> ScrubResult<Vec<SalesRecord>>
where
    S: RecordStore,
{
    let permits = Arc::new(Semaphore::new(options.max_concurrent_fetches.max(1)));

    let fetches = agents.iter().copied().map(|agent_id| {
        let permits = Arc::clone(&permits);
        async move {
            let _permit = permits.acquire().await.map_err(|err| {
                scrub_error!(
                    ErrorKind::FetchFailed,
                    "fetch permit unavailable",
                    source: err
                )
            })?;
            fetch_partition(store, agent_id, options).await
        }
    });

    let partitions = try_join_all(fetches).await?;

    Ok(partitions.into_iter().flatten().collect())
}

/// Fetches every agent partition one at a time, no overlap.
///
/// Reference path with the same contract as [`fetch_all_concurrent`]; for a
/// fixed source table both produce the same multiset of records.
pub async fn fetch_all_sequential<S>(
    store: &S,
    agents: &[AgentId],
    options: &FetchOptions,
) -> ScrubResult<Vec<SalesRecord>>
where
    S: RecordStore,
{
    let mut merged = Vec::new();
    for &agent_id in agents {
        merged.extend(fetch_partition(store, agent_id, options).await?);
    }

    Ok(merged)
}

async fn fetch_partition<S>(
    store: &S,
    agent_id: AgentId,
    options: &FetchOptions,
) -> ScrubResult<Vec<SalesRecord>>
where
    S: RecordStore,
{
    if !options.latency.is_zero() {
        tokio::time::sleep(options.latency).await;
    }

    debug!(agent_id = %agent_id, "gathering partition");

    let fetch = store.fetch_by_agent(agent_id);
    match options.timeout {
        Some(limit) => tokio::time::timeout(limit, fetch).await.map_err(|_| {
            scrub_error!(
                ErrorKind::FetchFailed,
                "partition fetch timed out",
                agent_id
            )
        })?,
        None => fetch.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryRecordStore;
    use rand::seq::SliceRandom;
    use rand::thread_rng;

    fn records_across_partitions() -> Vec<SalesRecord> {
        (0..30)
            .map(|n| SalesRecord::new(n, n % 5, format!("agent-{}", n % 5), n * 3 - 10))
            .collect()
    }

    fn sorted_by_row_id(mut records: Vec<SalesRecord>) -> Vec<SalesRecord> {
        records.sort_by_key(|r| r.row_id);
        records
    }

    #[tokio::test]
    async fn concurrent_merge_is_complete_regardless_of_completion_order() {
        let source = records_across_partitions();
        let store = MemoryRecordStore::new(source.clone());
        store.open().await.unwrap();

        // Randomized per-partition delays shuffle the completion order.
        let mut delays: Vec<u64> = (0..5).map(|n| n * 7).collect();
        delays.shuffle(&mut thread_rng());
        for (agent, millis) in delays.iter().enumerate() {
            store
                .set_fetch_delay(AgentId(agent as i64), Duration::from_millis(*millis))
                .await;
        }

        let agents = store.agent_ids().await.unwrap();
        let merged = fetch_all_concurrent(&store, &agents, &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(merged.len(), source.len());
        assert_eq!(sorted_by_row_id(merged), sorted_by_row_id(source));
    }

    #[tokio::test]
    async fn concurrent_and_sequential_merge_the_same_multiset() {
        let source = records_across_partitions();
        let store = MemoryRecordStore::new(source);
        store.open().await.unwrap();

        let agents = store.agent_ids().await.unwrap();
        let options = FetchOptions::default();

        let concurrent = fetch_all_concurrent(&store, &agents, &options).await.unwrap();
        let sequential = fetch_all_sequential(&store, &agents, &options).await.unwrap();

        assert_eq!(sorted_by_row_id(concurrent), sorted_by_row_id(sequential));
    }

    #[tokio::test]
    async fn gather_fails_when_any_partition_fetch_fails() {
        let store = MemoryRecordStore::new(records_across_partitions());
        store.open().await.unwrap();
        let agents = store.agent_ids().await.unwrap();

        // Closing mid-gather makes later fetches fail.
        store.close().await.unwrap();

        let result = fetch_all_concurrent(&store, &agents, &FetchOptions::default()).await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn slow_partition_trips_the_timeout() {
        let store = MemoryRecordStore::new(records_across_partitions());
        store.open().await.unwrap();
        store
            .set_fetch_delay(AgentId(2), Duration::from_millis(200))
            .await;

        let agents = store.agent_ids().await.unwrap();
        let options = FetchOptions {
            timeout: Some(Duration::from_millis(20)),
            ..FetchOptions::default()
        };

        let result = fetch_all_concurrent(&store, &agents, &options).await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::FetchFailed);
    }
}
