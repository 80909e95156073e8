use super::errors::EventLogError;
use super::types::OrchestrationEventLog;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use tracing::debug;

/// Durable, append-only persistence for [`OrchestrationEventLog`] rows
pub trait OrchestrationEventLogStore: Send + Sync {
    fn append(&self, log: OrchestrationEventLog) -> Result<(), EventLogError>;

    /// Rows of a plan execution created at or after `since`, oldest first
    fn find_for_plan_since(
        &self,
        plan_execution_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<OrchestrationEventLog>, EventLogError>;

    /// Plan executions with at least one row created at or after `since`, sorted
    fn plan_execution_ids_since(&self, since: DateTime<Utc>) -> Result<Vec<String>, EventLogError>;

    /// Remove rows whose TTL has passed; returns how many were removed
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, EventLogError>;

    fn delete_for_plan(&self, plan_execution_id: &str) -> Result<usize, EventLogError>;
}

#[derive(Debug, Default)]
pub struct InMemoryOrchestrationEventLogStore {
    logs: RwLock<Vec<OrchestrationEventLog>>,
}

impl InMemoryOrchestrationEventLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.logs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.read().is_empty()
    }

    pub fn count_for_plan(&self, plan_execution_id: &str) -> usize {
        self.logs
            .read()
            .iter()
            .filter(|log| log.plan_execution_id == plan_execution_id)
            .count()
    }
}

impl OrchestrationEventLogStore for InMemoryOrchestrationEventLogStore {
    fn append(&self, log: OrchestrationEventLog) -> Result<(), EventLogError> {
        self.logs.write().push(log);
        Ok(())
    }

    fn find_for_plan_since(
        &self,
        plan_execution_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<OrchestrationEventLog>, EventLogError> {
        let mut found: Vec<_> = self
            .logs
            .read()
            .iter()
            .filter(|log| log.plan_execution_id == plan_execution_id && log.created_at >= since)
            .cloned()
            .collect();
        found.sort_by_key(|log| log.created_at);
        Ok(found)
    }

    fn plan_execution_ids_since(&self, since: DateTime<Utc>) -> Result<Vec<String>, EventLogError> {
        let ids: BTreeSet<String> = self
            .logs
            .read()
            .iter()
            .filter(|log| log.created_at >= since)
            .map(|log| log.plan_execution_id.clone())
            .collect();
        Ok(ids.into_iter().collect())
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, EventLogError> {
        let mut logs = self.logs.write();
        let before = logs.len();
        logs.retain(|log| !log.is_expired(now));
        let purged = before - logs.len();
        debug!(purged, "Purged expired event logs");
        Ok(purged)
    }

    fn delete_for_plan(&self, plan_execution_id: &str) -> Result<usize, EventLogError> {
        let mut logs = self.logs.write();
        let before = logs.len();
        logs.retain(|log| log.plan_execution_id != plan_execution_id);
        Ok(before - logs.len())
    }
}
