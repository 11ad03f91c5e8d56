//! Store wrapper that records lifecycle calls and injects faults.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::bail;
use crate::error::{ErrorKind, ScrubResult};
use crate::store::base::RecordStore;
use crate::types::{AgentId, SalesRecord};

#[derive(Debug, Default)]
struct Inner {
    open_calls: u64,
    close_calls: u64,
    fail_fetch_for: Option<AgentId>,
    fail_write: bool,
    fail_close: bool,
}

/// Wraps any [`RecordStore`], counting open/close calls and optionally
/// failing a chosen fetch partition, the clean write, or the close.
///
/// Used to assert the pipeline's resource contract: close runs exactly once
/// per open, on every exit path, and a close failure never masks the stage
/// failure already in flight.
#[derive(Debug, Clone)]
pub struct TestStoreWrapper<S> {
    store: S,
    state: Arc<Mutex<Inner>>,
}

impl<S> TestStoreWrapper<S> {
    pub fn wrap(store: S) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Makes every fetch of `agent_id` fail with a fetch error.
    pub async fn fail_fetch_for(&self, agent_id: AgentId) {
        self.state.lock().await.fail_fetch_for = Some(agent_id);
    }

    /// Makes the next clean write fail.
    pub async fn fail_write(&self) {
        self.state.lock().await.fail_write = true;
    }

    /// Makes close fail after delegating to the wrapped store.
    pub async fn fail_close(&self) {
        self.state.lock().await.fail_close = true;
    }

    pub async fn open_calls(&self) -> u64 {
        self.state.lock().await.open_calls
    }

    pub async fn close_calls(&self) -> u64 {
        self.state.lock().await.close_calls
    }
}

impl<S> RecordStore for TestStoreWrapper<S>
where
    S: RecordStore + Sync,
{
    async fn open(&self) -> ScrubResult<()> {
        self.state.lock().await.open_calls += 1;
        self.store.open().await
    }

    async fn agent_ids(&self) -> ScrubResult<Vec<AgentId>> {
        self.store.agent_ids().await
    }

    async fn fetch_by_agent(&self, agent_id: AgentId) -> ScrubResult<Vec<SalesRecord>> {
        let should_fail = {
            let state = self.state.lock().await;
            state.fail_fetch_for == Some(agent_id)
        };
        if should_fail {
            bail!(
                ErrorKind::FetchFailed,
                "injected partition fetch failure",
                agent_id
            );
        }

        self.store.fetch_by_agent(agent_id).await
    }

    async fn write_clean(&self, records: &[SalesRecord]) -> ScrubResult<u64> {
        let should_fail = self.state.lock().await.fail_write;
        if should_fail {
            bail!(ErrorKind::WriteFailed, "injected clean write failure");
        }

        self.store.write_clean(records).await
    }

    async fn read_clean(&self) -> ScrubResult<Vec<SalesRecord>> {
        self.store.read_clean().await
    }

    async fn close(&self) -> ScrubResult<()> {
        let should_fail = {
            let mut state = self.state.lock().await;
            state.close_calls += 1;
            state.fail_close
        };

        // Delegate first so wrapped resources are actually released, then
        // surface the injected failure.
        let result = self.store.close().await;
        if should_fail {
            bail!(ErrorKind::CleanupFailed, "injected close failure");
        }

        result
    }
}
