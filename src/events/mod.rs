//! # Orchestration Event Log
//!
//! Append-only log of node and plan transitions with batched change signals for
//! visualization consumers.
//!
//! - [`types`] - log rows, event types and the log-event message
//! - [`log_store`] - durable row storage with TTL expiry
//! - [`batch_counter`] - per-plan-execution batching counters
//! - [`publisher`] - log-event producers
//! - [`log_publisher`] - the observer persisting rows and flushing batches
//! - [`observer`] - the listener list invoked by the execution engine
//! - [`sweeper`] - redelivery of signals lost between persist and flush

pub mod batch_counter;
pub mod errors;
pub mod log_publisher;
pub mod log_store;
pub mod observer;
pub mod publisher;
pub mod sweeper;
pub mod types;

pub use batch_counter::{BatchCounterCache, InMemoryBatchCounter};
pub use errors::{CacheError, EventLogError, PublishError};
pub use log_publisher::{LogPublisherStats, OrchestrationLogPublisher};
pub use log_store::{InMemoryOrchestrationEventLogStore, OrchestrationEventLogStore};
pub use observer::{ObserverRegistry, OrchestrationObserver};
pub use publisher::{BroadcastLogEventProducer, ChannelLogEventProducer, LogEventProducer};
pub use sweeper::OrchestrationLogSweeper;
pub use types::{
    LogEventMessage, OrchestrationEventLog, OrchestrationEventType, DEFAULT_EVENT_LOG_TTL_DAYS,
};
