//! Core data types flowing through the pipeline.

use std::fmt;

/// Unique identifier of a pipeline run, used for log correlation.
pub type PipelineId = u64;

/// Identifier of a sales agent, the unit of partitioned fetch work.
///
/// The set of known agent ids is derived from the source table's distinct
/// values before the gather starts and is never mutated mid-fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(pub i64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AgentId {
    fn from(value: i64) -> Self {
        AgentId(value)
    }
}

/// A single row of the source sales table.
///
/// Immutable once read: records are only filtered and re-persisted, never
/// mutated. The clean table shares this shape; a record is clean when its
/// amount is strictly positive and not prime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct SalesRecord {
    /// Row identifier, unique within the source table.
    pub row_id: i64,
    /// Owning agent.
    pub agent_id: i64,
    /// Agent display name.
    pub agent: String,
    /// Sale amount; may be zero, negative, or positive.
    pub amount: i64,
}

impl SalesRecord {
    pub fn new(row_id: i64, agent_id: i64, agent: impl Into<String>, amount: i64) -> Self {
        Self {
            row_id,
            agent_id,
            agent: agent.into(),
            amount,
        }
    }

    /// Returns the agent partition this record belongs to.
    pub fn partition(&self) -> AgentId {
        AgentId(self.agent_id)
    }
}
