use thiserror::Error;

/// Failure to persist or read orchestration event log rows
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventLogError {
    #[error("Failed to store event log for plan execution {plan_execution_id}: {reason}")]
    Storage {
        plan_execution_id: String,
        reason: String,
    },

    #[error("Observer {observer} panicked: {reason}")]
    ObserverPanicked { observer: String, reason: String },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Failure to publish a log event to the external stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("Log event channel is closed")]
    ChannelClosed,

    #[error("Log event channel is full, dropped event for plan execution {plan_execution_id}")]
    ChannelFull { plan_execution_id: String },

    #[error("Log event for plan execution {plan_execution_id} rejected: {reason}")]
    Rejected {
        plan_execution_id: String,
        reason: String,
    },
}

/// Failure of the shared batch counter cache
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("Batch counter unavailable for {key}: {reason}")]
    Unavailable { key: String, reason: String },

    #[error("Invalid batch size {batch_size}, must be at least 1")]
    InvalidBatchSize { batch_size: u64 },
}
