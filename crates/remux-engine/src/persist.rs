//! Persistence collaborator interface.
//!
//! Every lifecycle transition is offered to the sink; completed tasks
//! additionally offer a historical summary. Mirroring is best-effort: a sink
//! failure is logged and never rolls back or blocks an in-memory transition.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use remux_models::{TaskRecord, TaskSummary};

/// The external store could not record a transition.
#[derive(Debug, Clone, Error)]
#[error("persistence unavailable: {0}")]
pub struct PersistenceError(pub String);

impl PersistenceError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Durable store for task lifecycle transitions and completion history.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Record the task's current state after a transition.
    async fn record_transition(&self, record: &TaskRecord) -> Result<(), PersistenceError>;

    /// Record the historical summary of a completed task.
    async fn record_summary(&self, summary: &TaskSummary) -> Result<(), PersistenceError>;
}

/// Sink that records nothing. Useful when no durable store is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl PersistenceSink for NoopSink {
    async fn record_transition(&self, record: &TaskRecord) -> Result<(), PersistenceError> {
        debug!(task_id = %record.id, state = %record.state, "Dropping transition (no sink configured)");
        Ok(())
    }

    async fn record_summary(&self, summary: &TaskSummary) -> Result<(), PersistenceError> {
        debug!(task_id = %summary.task_id, "Dropping summary (no sink configured)");
        Ok(())
    }
}
