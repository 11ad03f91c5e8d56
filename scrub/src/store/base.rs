//! Store abstraction over the relational source of sales records.

use std::future::Future;

use crate::error::ScrubResult;
use crate::types::{AgentId, SalesRecord};

/// Access to the sales source table and the derived clean table.
///
/// The store owns the one shared connection for a pipeline run: the
/// orchestrator opens it, fetch and write operations borrow it, and only the
/// orchestrator closes it. Implementations must support concurrent
/// [`RecordStore::fetch_by_agent`] calls over the open connection.
pub trait RecordStore {
    /// Opens the connection to the backing store.
    ///
    /// Fails with [`crate::error::ErrorKind::ConnectionFailed`] when the
    /// store is unreachable or locked, and with
    /// [`crate::error::ErrorKind::InvalidState`] when already open.
    fn open(&self) -> impl Future<Output = ScrubResult<()>> + Send;

    /// Returns the distinct agent ids of the source table.
    ///
    /// The returned set partitions the source table: partitions are disjoint
    /// and their union is the full table.
    fn agent_ids(&self) -> impl Future<Output = ScrubResult<Vec<AgentId>>> + Send;

    /// Returns the ordered records of one agent partition. Read-only.
    fn fetch_by_agent(
        &self,
        agent_id: AgentId,
    ) -> impl Future<Output = ScrubResult<Vec<SalesRecord>>> + Send;

    /// Transactionally replaces the clean table's contents with `records`.
    ///
    /// Drop-and-recreate policy: the target table is recreated with the fixed
    /// four-column shape and all records inserted as a single atomic unit.
    /// On failure the prior contents remain visible. Returns the number of
    /// rows written.
    fn write_clean(
        &self,
        records: &[SalesRecord],
    ) -> impl Future<Output = ScrubResult<u64>> + Send;

    /// Returns the current contents of the clean table.
    ///
    /// After a successful [`RecordStore::write_clean`] this reflects exactly
    /// the written multiset.
    fn read_clean(&self) -> impl Future<Output = ScrubResult<Vec<SalesRecord>>> + Send;

    /// Closes the connection.
    ///
    /// Called exactly once per successful [`RecordStore::open`], on every
    /// exit path; only the pipeline orchestrator triggers it.
    fn close(&self) -> impl Future<Output = ScrubResult<()>> + Send;
}
