//! # Node Advise Helper
//!
//! Decides what happens after a node execution reaches a status and hands the decision to the
//! execution framework as an [`SdkResponseEvent`].
//!
//! ```text
//! engine                              NodeAdviseHelper processor
//!   |                                          |
//!   | queue_advising_event() -> try_send       | recv()
//!   v                                          v
//! mpsc::Sender<AdviseCommand>   ->   mpsc::Receiver<AdviseCommand>
//!                                              |
//!                                              v
//!                                   advise() -> SdkResponseEventPublisher
//! ```
//!
//! Queuing never blocks: a full queue is reported as [`AdviseError::QueueFull`] instead of
//! stalling the caller, and the decision is applied after `queue_advising_event` returns.
//!
//! ## Outcomes of `advise`
//!
//! - Node has advisers: every obtainment is resolved up front (an unregistered type fails the
//!   whole call), then the first adviser whose `can_advise` accepts decides. No taker yields
//!   [`AdviserResponse::Unknown`].
//! - Node has no advisers: see
//!   [`get_response_in_case_of_no_custom_adviser`](NodeAdviseHelper::get_response_in_case_of_no_custom_adviser).
//! - Adviser resolution or an adviser fails: a `HANDLE_EVENT_ERROR` event carrying the error
//!   and the node's failure types.

use super::adviser::Adviser;
use super::errors::{AdviseError, AdviseResult};
use super::registry::AdviserRegistry;
use super::types::{AdviserResponse, AdvisingEvent, SdkResponseEvent};
use crate::constants::Status;
use crate::logging::log_node_operation;
use crate::models::NodeExecution;
use crate::plan::PlanNode;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Destination of advise decisions
#[async_trait]
pub trait SdkResponseEventPublisher: Send + Sync {
    async fn publish(&self, event: SdkResponseEvent) -> AdviseResult<()>;
}

/// Publisher forwarding events into a channel owned by the execution framework
#[derive(Debug, Clone)]
pub struct ChannelSdkResponsePublisher {
    sender: mpsc::Sender<SdkResponseEvent>,
}

impl ChannelSdkResponsePublisher {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SdkResponseEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl SdkResponseEventPublisher for ChannelSdkResponsePublisher {
    async fn publish(&self, event: SdkResponseEvent) -> AdviseResult<()> {
        let node_execution_id = event.node_execution_id.clone();
        self.sender
            .send(event)
            .await
            .map_err(|e| AdviseError::ResponseDelivery {
                node_execution_id,
                reason: e.to_string(),
            })
    }
}

/// A node execution waiting to be advised
#[derive(Debug, Clone)]
pub struct AdviseCommand {
    pub node_execution: NodeExecution,
    pub plan_node: PlanNode,
    pub to_status: Status,
}

#[derive(Debug, Default)]
struct AdviseStats {
    queued: AtomicU64,
    dropped: AtomicU64,
    advised: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time advise queue statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdviseQueueStats {
    pub queued: u64,
    pub dropped: u64,
    pub advised: u64,
    pub errors: u64,
}

pub struct NodeAdviseHelper {
    registry: Arc<AdviserRegistry>,
    publisher: Arc<dyn SdkResponseEventPublisher>,
    stats: Arc<AdviseStats>,
}

impl NodeAdviseHelper {
    pub fn new(
        registry: Arc<AdviserRegistry>,
        publisher: Arc<dyn SdkResponseEventPublisher>,
    ) -> Self {
        Self {
            registry,
            publisher,
            stats: Arc::new(AdviseStats::default()),
        }
    }

    /// Start the background processor; returns the queue handle and the processor task
    pub fn spawn(self, queue_capacity: usize) -> (AdviseQueueHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let handle = AdviseQueueHandle {
            sender,
            stats: Arc::clone(&self.stats),
        };
        let task = tokio::spawn(self.run(receiver));
        (handle, task)
    }

    #[instrument(skip_all, name = "node_advise_processor")]
    async fn run(self, mut receiver: mpsc::Receiver<AdviseCommand>) {
        info!("Starting node advise processor");
        while let Some(command) = receiver.recv().await {
            let Some(event) =
                self.advise(&command.node_execution, &command.plan_node, command.to_status)
            else {
                debug!(
                    node_execution_id = %command.node_execution.uuid,
                    "Nothing to advise"
                );
                continue;
            };
            self.stats.advised.fetch_add(1, Ordering::SeqCst);
            if let Err(e) = self.publisher.publish(event).await {
                self.stats.errors.fetch_add(1, Ordering::SeqCst);
                error!(error = %e, "Failed to publish advise response");
            }
        }
        info!("Node advise processor stopped");
    }

    /// Advise synchronously. `None` means no action is needed.
    pub fn advise(
        &self,
        node_execution: &NodeExecution,
        plan_node: &PlanNode,
        to_status: Status,
    ) -> Option<SdkResponseEvent> {
        if plan_node.adviser_obtainments().is_empty() {
            return self.get_response_in_case_of_no_custom_adviser(
                node_execution,
                plan_node,
                to_status,
            );
        }

        match self.select_response(node_execution, plan_node, to_status) {
            Ok(response) => {
                log_node_operation(
                    "advise",
                    node_execution.plan_execution_id(),
                    Some(&node_execution.uuid),
                    to_status.as_str(),
                    Some(&format!("{response:?}")),
                );
                Some(SdkResponseEvent::adviser_response(
                    node_execution.plan_execution_id(),
                    &node_execution.uuid,
                    response,
                    to_status,
                ))
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::SeqCst);
                error!(
                    node_execution_id = %node_execution.uuid,
                    plan_node_id = %plan_node.uuid(),
                    error = %e,
                    "Advising failed"
                );
                let failure_types = node_execution
                    .failure_info
                    .as_ref()
                    .map(|info| info.all_failure_types())
                    .unwrap_or_default();
                Some(SdkResponseEvent::event_error(
                    node_execution.plan_execution_id(),
                    &node_execution.uuid,
                    e.to_string(),
                    failure_types,
                ))
            }
        }
    }

    /// Response for a node without advisers: a `HANDLE_ADVISER_RESPONSE` carrying
    /// [`AdviserResponse::Unknown`] when the node reached a final status with failure info or
    /// interrupt history, `None` otherwise (including when the node has advisers)
    pub fn get_response_in_case_of_no_custom_adviser(
        &self,
        node_execution: &NodeExecution,
        plan_node: &PlanNode,
        to_status: Status,
    ) -> Option<SdkResponseEvent> {
        if !plan_node.adviser_obtainments().is_empty() || !to_status.is_final() {
            return None;
        }
        if !node_execution.has_failure_info() && node_execution.interrupt_histories.is_empty() {
            return None;
        }
        Some(SdkResponseEvent::adviser_response(
            node_execution.plan_execution_id(),
            &node_execution.uuid,
            AdviserResponse::Unknown,
            to_status,
        ))
    }

    fn select_response(
        &self,
        node_execution: &NodeExecution,
        plan_node: &PlanNode,
        to_status: Status,
    ) -> AdviseResult<AdviserResponse> {
        let advisers: Vec<(Arc<dyn Adviser>, &[u8])> = plan_node
            .adviser_obtainments()
            .iter()
            .map(|obtainment| {
                self.registry
                    .obtain(&obtainment.adviser_type, plan_node.uuid())
                    .map(|adviser| (adviser, obtainment.parameters.as_slice()))
            })
            .collect::<AdviseResult<_>>()?;

        let base = AdvisingEvent::from_node_execution(node_execution, to_status);
        for (adviser, parameters) in advisers {
            let event = base.with_parameters(parameters);
            if adviser.can_advise(&event)? {
                return adviser.on_advise(&event);
            }
        }
        Ok(AdviserResponse::Unknown)
    }
}

/// Cloneable sender side of the advise queue
#[derive(Clone)]
pub struct AdviseQueueHandle {
    sender: mpsc::Sender<AdviseCommand>,
    stats: Arc<AdviseStats>,
}

impl std::fmt::Debug for AdviseQueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdviseQueueHandle")
            .field("capacity", &self.sender.capacity())
            .finish()
    }
}

impl AdviseQueueHandle {
    /// Queue a finished node execution for advising without waiting for the decision
    pub fn queue_advising_event(
        &self,
        node_execution: NodeExecution,
        plan_node: PlanNode,
        to_status: Status,
    ) -> AdviseResult<()> {
        let node_execution_id = node_execution.uuid.clone();
        let command = AdviseCommand {
            node_execution,
            plan_node,
            to_status,
        };
        match self.sender.try_send(command) {
            Ok(()) => {
                self.stats.queued.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::SeqCst);
                warn!(node_execution_id = %node_execution_id, "Advise queue full");
                Err(AdviseError::QueueFull { node_execution_id })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("Advise queue closed");
                Err(AdviseError::QueueClosed)
            }
        }
    }

    pub fn stats(&self) -> AdviseQueueStats {
        AdviseQueueStats {
            queued: self.stats.queued.load(Ordering::SeqCst),
            dropped: self.stats.dropped.load(Ordering::SeqCst),
            advised: self.stats.advised.load(Ordering::SeqCst),
            errors: self.stats.errors.load(Ordering::SeqCst),
        }
    }
}
