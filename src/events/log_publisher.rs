//! # Orchestration Log Publisher
//!
//! Records every node and plan transition in the event log and batches "re-read the log"
//! signals to the visualization stream.
//!
//! Each callback does two things, in order:
//!
//! 1. Appends one [`OrchestrationEventLog`] row. A failure here is returned to the caller.
//! 2. Counts the event for its plan execution and, once the batch is full, sends one
//!    [`LogEventMessage`]. A failure here is logged and swallowed.
//!
//! A final plan status always signals, so consumers see the terminal state even when the
//! last batch is partial, and the plan execution's counter is then dropped.
//!
//! Delivery is at-least-once durable but at-most-once signalled: if the process stops between
//! the two steps the row survives, and [`OrchestrationLogSweeper`](super::OrchestrationLogSweeper)
//! re-signals it, but the batched signal itself is gone.

use super::batch_counter::BatchCounterCache;
use super::errors::EventLogError;
use super::log_store::OrchestrationEventLogStore;
use super::observer::OrchestrationObserver;
use super::publisher::LogEventProducer;
use super::types::{LogEventMessage, OrchestrationEventLog, OrchestrationEventType};
use crate::config::EventLogConfig;
use crate::constants::Status;
use crate::models::{Ambiance, NodeExecution};
use chrono::Duration;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Counters describing publisher activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogPublisherStats {
    pub persisted: u64,
    pub flushed: u64,
    pub batch_failures: u64,
}

pub struct OrchestrationLogPublisher {
    store: Arc<dyn OrchestrationEventLogStore>,
    counter: Arc<dyn BatchCounterCache>,
    producer: Arc<dyn LogEventProducer>,
    batch_size: u64,
    ttl: Duration,
    persisted: AtomicU64,
    flushed: AtomicU64,
    batch_failures: AtomicU64,
}

impl OrchestrationLogPublisher {
    pub fn new(
        store: Arc<dyn OrchestrationEventLogStore>,
        counter: Arc<dyn BatchCounterCache>,
        producer: Arc<dyn LogEventProducer>,
        config: &EventLogConfig,
    ) -> Self {
        Self {
            store,
            counter,
            producer,
            batch_size: config.batch_size,
            ttl: Duration::days(config.ttl_days),
            persisted: AtomicU64::new(0),
            flushed: AtomicU64::new(0),
            batch_failures: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> LogPublisherStats {
        LogPublisherStats {
            persisted: self.persisted.load(Ordering::SeqCst),
            flushed: self.flushed.load(Ordering::SeqCst),
            batch_failures: self.batch_failures.load(Ordering::SeqCst),
        }
    }

    pub fn on_node_start(&self, node_execution: &NodeExecution) -> Result<(), EventLogError> {
        self.record(
            node_execution.plan_execution_id(),
            Some(&node_execution.uuid),
            OrchestrationEventType::NodeExecutionStart,
        )
    }

    pub fn on_node_status_update(
        &self,
        node_execution: &NodeExecution,
    ) -> Result<(), EventLogError> {
        self.record(
            node_execution.plan_execution_id(),
            Some(&node_execution.uuid),
            OrchestrationEventType::NodeExecutionStatusUpdate,
        )
    }

    pub fn on_node_update(&self, node_execution: &NodeExecution) -> Result<(), EventLogError> {
        self.record(
            node_execution.plan_execution_id(),
            Some(&node_execution.uuid),
            OrchestrationEventType::NodeExecutionUpdate,
        )
    }

    pub fn on_plan_status_update(
        &self,
        ambiance: &Ambiance,
        status: Status,
    ) -> Result<(), EventLogError> {
        debug!(
            plan_execution_id = %ambiance.plan_execution_id,
            status = %status,
            "Plan status update"
        );
        let plan_execution_id = ambiance.plan_execution_id.as_str();
        if !status.is_final() {
            return self.record(
                plan_execution_id,
                None,
                OrchestrationEventType::PlanExecutionStatusUpdate,
            );
        }
        let result = self.record_closing(plan_execution_id);
        self.counter.remove(plan_execution_id);
        result
    }

    pub fn on_step_details_update(
        &self,
        plan_execution_id: &str,
        node_execution_id: &str,
    ) -> Result<(), EventLogError> {
        self.record(
            plan_execution_id,
            Some(node_execution_id),
            OrchestrationEventType::StepDetailsUpdate,
        )
    }

    pub fn on_step_inputs_add(
        &self,
        plan_execution_id: &str,
        node_execution_id: &str,
    ) -> Result<(), EventLogError> {
        self.record(
            plan_execution_id,
            Some(node_execution_id),
            OrchestrationEventType::StepInputsUpdate,
        )
    }

    fn record(
        &self,
        plan_execution_id: &str,
        node_execution_id: Option<&str>,
        event_type: OrchestrationEventType,
    ) -> Result<(), EventLogError> {
        self.record_with(plan_execution_id, node_execution_id, event_type, false)
    }

    /// Record the final plan status and signal whatever the batch holds
    fn record_closing(&self, plan_execution_id: &str) -> Result<(), EventLogError> {
        self.record_with(
            plan_execution_id,
            None,
            OrchestrationEventType::PlanExecutionStatusUpdate,
            true,
        )
    }

    #[instrument(skip(self), level = "debug")]
    fn record_with(
        &self,
        plan_execution_id: &str,
        node_execution_id: Option<&str>,
        event_type: OrchestrationEventType,
        closing: bool,
    ) -> Result<(), EventLogError> {
        let log = OrchestrationEventLog::new(
            plan_execution_id,
            node_execution_id.map(str::to_string),
            event_type,
            self.ttl,
        );
        self.store.append(log)?;
        self.persisted.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = self.batch(plan_execution_id, closing) {
            self.batch_failures.fetch_add(1, Ordering::SeqCst);
            warn!(
                plan_execution_id = %plan_execution_id,
                error = %e,
                "Failed to batch log event, row is persisted for redelivery"
            );
        }
        Ok(())
    }

    fn batch(&self, plan_execution_id: &str, closing: bool) -> Result<(), EventLogError> {
        let due = self.counter.increment(plan_execution_id, self.batch_size)?;
        if !due && !closing {
            return Ok(());
        }
        self.producer
            .send(LogEventMessage::new(plan_execution_id))?;
        self.flushed.fetch_add(1, Ordering::SeqCst);
        debug!(plan_execution_id = %plan_execution_id, "Flushed log event batch");
        Ok(())
    }
}

impl OrchestrationObserver for OrchestrationLogPublisher {
    fn name(&self) -> &'static str {
        "OrchestrationLogPublisher"
    }

    fn on_node_start(&self, node_execution: &NodeExecution) -> Result<(), EventLogError> {
        OrchestrationLogPublisher::on_node_start(self, node_execution)
    }

    fn on_node_status_update(&self, node_execution: &NodeExecution) -> Result<(), EventLogError> {
        OrchestrationLogPublisher::on_node_status_update(self, node_execution)
    }

    fn on_node_update(&self, node_execution: &NodeExecution) -> Result<(), EventLogError> {
        OrchestrationLogPublisher::on_node_update(self, node_execution)
    }

    fn on_plan_status_update(
        &self,
        ambiance: &Ambiance,
        status: Status,
    ) -> Result<(), EventLogError> {
        OrchestrationLogPublisher::on_plan_status_update(self, ambiance, status)
    }

    fn on_step_details_update(
        &self,
        plan_execution_id: &str,
        node_execution_id: &str,
    ) -> Result<(), EventLogError> {
        OrchestrationLogPublisher::on_step_details_update(
            self,
            plan_execution_id,
            node_execution_id,
        )
    }

    fn on_step_inputs_add(
        &self,
        plan_execution_id: &str,
        node_execution_id: &str,
    ) -> Result<(), EventLogError> {
        OrchestrationLogPublisher::on_step_inputs_add(self, plan_execution_id, node_execution_id)
    }
}
