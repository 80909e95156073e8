use super::errors::EventLogError;
use super::log_store::OrchestrationEventLogStore;
use super::publisher::LogEventProducer;
use super::types::LogEventMessage;
use crate::logging::log_publisher_operation;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Metadata key marking a log event as a redelivery
pub const REDELIVERY_METADATA_KEY: &str = "redelivery";

/// Re-signals plan executions whose rows may have missed their batched log event
pub struct OrchestrationLogSweeper {
    store: Arc<dyn OrchestrationEventLogStore>,
    producer: Arc<dyn LogEventProducer>,
}

impl OrchestrationLogSweeper {
    pub fn new(
        store: Arc<dyn OrchestrationEventLogStore>,
        producer: Arc<dyn LogEventProducer>,
    ) -> Self {
        Self { store, producer }
    }

    /// Send one log event per plan execution with rows created at or after `since`.
    /// Returns how many were sent; individual send failures are logged and skipped.
    #[instrument(skip(self))]
    pub fn sweep(&self, since: DateTime<Utc>) -> Result<usize, EventLogError> {
        let mut sent = 0;
        for plan_execution_id in self.store.plan_execution_ids_since(since)? {
            let message = LogEventMessage::new(plan_execution_id.as_str())
                .with_metadata(REDELIVERY_METADATA_KEY, "true");
            match self.producer.send(message) {
                Ok(()) => {
                    sent += 1;
                    log_publisher_operation("redeliver", &plan_execution_id, "sent", None);
                }
                Err(e) => warn!(
                    plan_execution_id = %plan_execution_id,
                    error = %e,
                    "Failed to redeliver log event"
                ),
            }
        }
        info!(sent, "Swept orchestration event logs");
        Ok(sent)
    }

    /// Drop rows past their TTL
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, EventLogError> {
        self.store.purge_expired(now)
    }
}
