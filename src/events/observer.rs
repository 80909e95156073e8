//! # Orchestration Observers
//!
//! The execution engine reports every transition to an [`ObserverRegistry`] from its
//! transition-commit path. The registry calls each registered [`OrchestrationObserver`] in
//! registration order and contains whatever goes wrong inside one: errors are logged, panics
//! are caught, and the remaining observers still run. The transition itself never fails
//! because of an observer.

use super::errors::EventLogError;
use crate::constants::Status;
use crate::models::{Ambiance, NodeExecution};
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Listener for node and plan transitions. Every callback defaults to a no-op.
pub trait OrchestrationObserver: Send + Sync {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn on_node_start(&self, _node_execution: &NodeExecution) -> Result<(), EventLogError> {
        Ok(())
    }

    fn on_node_status_update(&self, _node_execution: &NodeExecution) -> Result<(), EventLogError> {
        Ok(())
    }

    fn on_node_update(&self, _node_execution: &NodeExecution) -> Result<(), EventLogError> {
        Ok(())
    }

    fn on_plan_status_update(
        &self,
        _ambiance: &Ambiance,
        _status: Status,
    ) -> Result<(), EventLogError> {
        Ok(())
    }

    fn on_step_details_update(
        &self,
        _plan_execution_id: &str,
        _node_execution_id: &str,
    ) -> Result<(), EventLogError> {
        Ok(())
    }

    fn on_step_inputs_add(
        &self,
        _plan_execution_id: &str,
        _node_execution_id: &str,
    ) -> Result<(), EventLogError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct ObserverRegistry {
    observers: RwLock<Vec<Arc<dyn OrchestrationObserver>>>,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.observers.read().iter().map(|o| o.name()).collect();
        f.debug_struct("ObserverRegistry")
            .field("observers", &names)
            .finish()
    }
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: Arc<dyn OrchestrationObserver>) {
        debug!(observer = observer.name(), "Registered orchestration observer");
        self.observers.write().push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Returns the number of observers that failed
    pub fn node_started(&self, node_execution: &NodeExecution) -> usize {
        self.notify("on_node_start", |o| o.on_node_start(node_execution))
    }

    pub fn node_status_updated(&self, node_execution: &NodeExecution) -> usize {
        self.notify("on_node_status_update", |o| {
            o.on_node_status_update(node_execution)
        })
    }

    pub fn node_updated(&self, node_execution: &NodeExecution) -> usize {
        self.notify("on_node_update", |o| o.on_node_update(node_execution))
    }

    pub fn plan_status_updated(&self, ambiance: &Ambiance, status: Status) -> usize {
        self.notify("on_plan_status_update", |o| {
            o.on_plan_status_update(ambiance, status)
        })
    }

    pub fn step_details_updated(&self, plan_execution_id: &str, node_execution_id: &str) -> usize {
        self.notify("on_step_details_update", |o| {
            o.on_step_details_update(plan_execution_id, node_execution_id)
        })
    }

    pub fn step_inputs_added(&self, plan_execution_id: &str, node_execution_id: &str) -> usize {
        self.notify("on_step_inputs_add", |o| {
            o.on_step_inputs_add(plan_execution_id, node_execution_id)
        })
    }

    fn notify<F>(&self, callback: &'static str, f: F) -> usize
    where
        F: Fn(&dyn OrchestrationObserver) -> Result<(), EventLogError>,
    {
        // Snapshot so observers may register others without deadlocking
        let observers: Vec<_> = self.observers.read().clone();
        let mut failed = 0;
        for observer in observers {
            match catch_unwind(AssertUnwindSafe(|| f(observer.as_ref()))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failed += 1;
                    warn!(
                        observer = observer.name(),
                        callback,
                        error = %e,
                        "Orchestration observer failed"
                    );
                }
                Err(panic) => {
                    failed += 1;
                    let err = EventLogError::ObserverPanicked {
                        observer: observer.name().to_string(),
                        reason: panic_message(panic.as_ref()),
                    };
                    error!(callback, error = %err, "Orchestration observer panicked");
                }
            }
        }
        failed
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
