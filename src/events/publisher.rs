//! Log-event producers: fire-and-forget delivery of [`LogEventMessage`]s to visualization
//! consumers.

use super::errors::PublishError;
use super::types::LogEventMessage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

/// External stream receiving "re-read the log" signals
pub trait LogEventProducer: Send + Sync {
    fn send(&self, message: LogEventMessage) -> Result<(), PublishError>;
}

/// Broadcast producer fanning log events out to every subscriber
#[derive(Debug, Clone)]
pub struct BroadcastLogEventProducer {
    sender: broadcast::Sender<LogEventMessage>,
    sent: Arc<AtomicU64>,
}

impl BroadcastLogEventProducer {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sent: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEventMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Messages sent since creation, including those nobody was listening for
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }
}

impl LogEventProducer for BroadcastLogEventProducer {
    fn send(&self, message: LogEventMessage) -> Result<(), PublishError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        // No subscribers is fine; consumers re-read the log when they attach
        if let Err(broadcast::error::SendError(message)) = self.sender.send(message) {
            debug!(
                plan_execution_id = %message.plan_execution_id,
                "Log event sent without subscribers"
            );
        }
        Ok(())
    }
}

impl Default for BroadcastLogEventProducer {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Bounded single-consumer producer; never blocks the caller
#[derive(Debug, Clone)]
pub struct ChannelLogEventProducer {
    sender: mpsc::Sender<LogEventMessage>,
}

impl ChannelLogEventProducer {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<LogEventMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl LogEventProducer for ChannelLogEventProducer {
    fn send(&self, message: LogEventMessage) -> Result<(), PublishError> {
        match self.sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(message)) => Err(PublishError::ChannelFull {
                plan_execution_id: message.plan_execution_id,
            }),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(PublishError::ChannelClosed),
        }
    }
}
