//! In-memory record store for tests and development.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;

use crate::bail;
use crate::error::{ErrorKind, ScrubResult};
use crate::store::base::RecordStore;
use crate::types::{AgentId, SalesRecord};

#[derive(Debug)]
struct Inner {
    opened: bool,
    source: Vec<SalesRecord>,
    clean: Option<Vec<SalesRecord>>,
    fetch_delays: HashMap<AgentId, Duration>,
}

/// Record store holding the source table in memory.
///
/// [`MemoryRecordStore`] mirrors the SQLite store's open/close discipline so
/// the pipeline's resource contract can be exercised without touching disk.
/// Per-agent fetch delays let tests vary the completion order of concurrent
/// fetches.
#[derive(Debug, Clone)]
pub struct MemoryRecordStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRecordStore {
    /// Creates a store whose source table holds the given records.
    pub fn new(source: Vec<SalesRecord>) -> Self {
        let inner = Inner {
            opened: false,
            source,
            clean: None,
            fetch_delays: HashMap::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Delays every fetch of `agent_id` by `delay`, simulating a slow
    /// connection for that partition.
    pub async fn set_fetch_delay(&self, agent_id: AgentId, delay: Duration) {
        let mut inner = self.inner.lock().await;
        inner.fetch_delays.insert(agent_id, delay);
    }

    /// Returns a copy of the clean table, or [`None`] when it was never written.
    pub async fn clean_table(&self) -> Option<Vec<SalesRecord>> {
        let inner = self.inner.lock().await;
        inner.clean.clone()
    }

    /// Returns whether the store is currently open.
    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.opened
    }

    async fn ensure_open(&self) -> ScrubResult<()> {
        let inner = self.inner.lock().await;
        if !inner.opened {
            bail!(ErrorKind::InvalidState, "memory store is not open");
        }
        Ok(())
    }
}

impl RecordStore for MemoryRecordStore {
    async fn open(&self) -> ScrubResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.opened {
            bail!(ErrorKind::InvalidState, "memory store is already open");
        }
        inner.opened = true;
        Ok(())
    }

    async fn agent_ids(&self) -> ScrubResult<Vec<AgentId>> {
        self.ensure_open().await?;

        let inner = self.inner.lock().await;
        let mut ids: Vec<AgentId> = inner.source.iter().map(|r| r.partition()).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn fetch_by_agent(&self, agent_id: AgentId) -> ScrubResult<Vec<SalesRecord>> {
        self.ensure_open().await?;

        // The delay runs outside the lock so concurrent fetches overlap on
        // their simulated waits, the same way real I/O waits overlap.
        let delay = {
            let inner = self.inner.lock().await;
            inner.fetch_delays.get(&agent_id).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let inner = self.inner.lock().await;
        Ok(inner
            .source
            .iter()
            .filter(|record| record.partition() == agent_id)
            .cloned()
            .collect())
    }

    async fn write_clean(&self, records: &[SalesRecord]) -> ScrubResult<u64> {
        self.ensure_open().await?;

        let mut inner = self.inner.lock().await;
        info!(rows = records.len(), "replacing in-memory clean table");
        inner.clean = Some(records.to_vec());
        Ok(records.len() as u64)
    }

    async fn read_clean(&self) -> ScrubResult<Vec<SalesRecord>> {
        self.ensure_open().await?;

        let inner = self.inner.lock().await;
        Ok(inner.clean.clone().unwrap_or_default())
    }

    async fn close(&self) -> ScrubResult<()> {
        let mut inner = self.inner.lock().await;
        if !inner.opened {
            bail!(ErrorKind::InvalidState, "memory store is not open");
        }
        inner.opened = false;
        Ok(())
    }
}
