//! Event log persistence, batching and redelivery through the observer registry

mod common;

use chrono::{Duration, Utc};
use common::builders::*;
use pipeline_core::config::EventLogConfig;
use pipeline_core::events::sweeper::REDELIVERY_METADATA_KEY;
use pipeline_core::events::{
    BatchCounterCache, CacheError, ChannelLogEventProducer, EventLogError, InMemoryBatchCounter,
    InMemoryOrchestrationEventLogStore, LogEventMessage, LogEventProducer, ObserverRegistry,
    OrchestrationEventLogStore, OrchestrationEventType, OrchestrationLogPublisher,
    OrchestrationLogSweeper, OrchestrationObserver, PublishError,
};
use pipeline_core::models::{Ambiance, NodeExecution};
use pipeline_core::Status;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

fn config(batch_size: u64) -> EventLogConfig {
    EventLogConfig {
        batch_size,
        ..EventLogConfig::default()
    }
}

fn execution(plan_execution_id: &str, runtime_id: &str) -> NodeExecution {
    NodeExecutionBuilder::new(plan_execution_id, "node", runtime_id, &[]).build()
}

fn drain(receiver: &mut mpsc::Receiver<LogEventMessage>) -> Vec<LogEventMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = receiver.try_recv() {
        messages.push(message);
    }
    messages
}

struct Harness {
    store: Arc<InMemoryOrchestrationEventLogStore>,
    publisher: Arc<OrchestrationLogPublisher>,
    observers: ObserverRegistry,
    receiver: mpsc::Receiver<LogEventMessage>,
}

impl Harness {
    fn new(config: EventLogConfig) -> Self {
        Self::with_parts(config, Arc::new(InMemoryBatchCounter::new()), None)
    }

    fn with_parts(
        config: EventLogConfig,
        counter: Arc<dyn BatchCounterCache>,
        producer: Option<Arc<dyn LogEventProducer>>,
    ) -> Self {
        let store = Arc::new(InMemoryOrchestrationEventLogStore::new());
        let (channel, receiver) = ChannelLogEventProducer::new(64);
        let producer = producer.unwrap_or_else(|| Arc::new(channel));
        let publisher = Arc::new(OrchestrationLogPublisher::new(
            store.clone(),
            counter,
            producer,
            &config,
        ));
        let observers = ObserverRegistry::new();
        observers.register(publisher.clone());
        Self {
            store,
            publisher,
            observers,
            receiver,
        }
    }
}

#[test]
fn test_signals_are_batched_per_plan_execution() {
    let mut harness = Harness::new(config(5));

    for i in 0..4 {
        assert_eq!(harness.observers.node_started(&execution("pe-a", &format!("ne-{i}"))), 0);
    }
    assert!(drain(&mut harness.receiver).is_empty());

    // Other plan executions never advance this one's batch
    harness.observers.node_started(&execution("pe-b", "ne-b"));
    assert!(drain(&mut harness.receiver).is_empty());

    harness
        .observers
        .plan_status_updated(&Ambiance::new("pe-a", "plan-1"), Status::Running);
    let messages = drain(&mut harness.receiver);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].plan_execution_id, "pe-a");

    // The counter restarts at one, so the next signal follows four more events
    for i in 0..4 {
        harness.observers.step_details_updated("pe-a", &format!("ne-{i}"));
    }
    assert_eq!(drain(&mut harness.receiver).len(), 1);

    assert_eq!(harness.store.count_for_plan("pe-a"), 9);
    assert_eq!(harness.store.count_for_plan("pe-b"), 1);
    let stats = harness.publisher.stats();
    assert_eq!(stats.persisted, 10);
    assert_eq!(stats.flushed, 2);
    assert_eq!(stats.batch_failures, 0);
}

#[test]
fn test_rows_carry_event_type_and_ttl() {
    let harness = Harness::new(EventLogConfig {
        batch_size: 100,
        ttl_days: 3,
        ..EventLogConfig::default()
    });
    let before = Utc::now();
    harness.observers.node_status_updated(&execution("pe-a", "ne-1"));
    harness.observers.step_inputs_added("pe-a", "ne-1");
    harness
        .observers
        .plan_status_updated(&Ambiance::new("pe-a", "plan-1"), Status::Succeeded);

    let rows = harness
        .store
        .find_for_plan_since("pe-a", before - Duration::seconds(1))
        .unwrap();
    let types: Vec<OrchestrationEventType> = rows.iter().map(|row| row.event_type).collect();
    assert_eq!(
        types,
        vec![
            OrchestrationEventType::NodeExecutionStatusUpdate,
            OrchestrationEventType::StepInputsUpdate,
            OrchestrationEventType::PlanExecutionStatusUpdate,
        ]
    );
    assert_eq!(rows[0].node_execution_id.as_deref(), Some("ne-1"));
    assert_eq!(rows[2].node_execution_id, None);
    for row in &rows {
        assert_eq!(row.valid_until - row.created_at, Duration::days(3));
    }

    let purged = harness.store.purge_expired(Utc::now() + Duration::days(4)).unwrap();
    assert_eq!(purged, 3);
    assert!(harness.store.is_empty());
}

#[test]
fn test_finished_plans_release_their_counters() {
    let counter = Arc::new(InMemoryBatchCounter::new());
    let mut harness = Harness::with_parts(config(5), counter.clone(), None);

    for i in 0..50 {
        let ambiance = Ambiance::new(format!("pe-{i}"), "plan-1");
        harness.observers.plan_status_updated(&ambiance, Status::Running);
        harness
            .observers
            .node_started(&execution(&ambiance.plan_execution_id, "ne-1"));
        harness.observers.plan_status_updated(&ambiance, Status::Succeeded);
    }

    assert!(counter.is_empty());
    // Each finished plan signals its partial batch once
    assert_eq!(drain(&mut harness.receiver).len(), 50);
    assert_eq!(harness.publisher.stats().flushed, 50);
}

/// Counter backend that is always down
struct UnavailableCounter;

impl BatchCounterCache for UnavailableCounter {
    fn increment(&self, plan_execution_id: &str, _batch_size: u64) -> Result<bool, CacheError> {
        Err(CacheError::Unavailable {
            key: plan_execution_id.to_string(),
            reason: "connection refused".to_string(),
        })
    }

    fn current(&self, _plan_execution_id: &str) -> Option<u64> {
        None
    }

    fn remove(&self, _plan_execution_id: &str) {}
}

#[test]
fn test_cache_outage_never_fails_the_transition() {
    let mut harness = Harness::with_parts(config(1), Arc::new(UnavailableCounter), None);

    assert_eq!(harness.observers.node_started(&execution("pe-a", "ne-1")), 0);
    assert_eq!(harness.store.count_for_plan("pe-a"), 1);
    assert!(drain(&mut harness.receiver).is_empty());
    assert_eq!(harness.publisher.stats().batch_failures, 1);
}

/// Producer that drops everything, as if the process died right after persisting
struct LostProducer;

impl LogEventProducer for LostProducer {
    fn send(&self, message: LogEventMessage) -> Result<(), PublishError> {
        Err(PublishError::Rejected {
            plan_execution_id: message.plan_execution_id,
            reason: "process stopped".to_string(),
        })
    }
}

#[test]
fn test_sweeper_redelivers_signals_lost_after_persist() {
    let since = Utc::now() - Duration::seconds(1);
    let harness = Harness::with_parts(
        config(1),
        Arc::new(InMemoryBatchCounter::new()),
        Some(Arc::new(LostProducer)),
    );
    harness.observers.node_started(&execution("pe-b", "ne-1"));
    harness.observers.node_started(&execution("pe-a", "ne-2"));
    harness.observers.node_updated(&execution("pe-a", "ne-2"));
    assert_eq!(harness.publisher.stats().batch_failures, 3);

    let (producer, mut receiver) = ChannelLogEventProducer::new(8);
    let sweeper = OrchestrationLogSweeper::new(harness.store.clone(), Arc::new(producer));
    assert_eq!(sweeper.sweep(since).unwrap(), 2);

    let messages = drain(&mut receiver);
    let plans: Vec<&str> = messages
        .iter()
        .map(|message| message.plan_execution_id.as_str())
        .collect();
    assert_eq!(plans, vec!["pe-a", "pe-b"]);
    assert!(messages
        .iter()
        .all(|message| message.metadata.get(REDELIVERY_METADATA_KEY).map(String::as_str)
            == Some("true")));

    // Nothing new since now
    assert_eq!(sweeper.sweep(Utc::now() + Duration::seconds(1)).unwrap(), 0);
}

struct PanickingObserver;

impl OrchestrationObserver for PanickingObserver {
    fn on_node_start(&self, _node_execution: &NodeExecution) -> Result<(), EventLogError> {
        panic!("observer bug");
    }
}

/// Observer counting the node starts it saw
#[derive(Default)]
struct CountingObserver {
    starts: AtomicUsize,
}

impl OrchestrationObserver for CountingObserver {
    fn on_node_start(&self, _node_execution: &NodeExecution) -> Result<(), EventLogError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_misbehaving_observer_is_isolated() {
    let harness = Harness::new(config(5));
    let counting = Arc::new(CountingObserver::default());
    harness.observers.register(Arc::new(PanickingObserver));
    harness.observers.register(counting.clone());

    let failures = harness.observers.node_started(&execution("pe-a", "ne-1"));

    assert_eq!(failures, 1);
    assert_eq!(harness.observers.len(), 3);
    assert_eq!(harness.store.count_for_plan("pe-a"), 1);
    assert_eq!(counting.starts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_observer_defaults_are_no_ops() {
    let registry = ObserverRegistry::new();
    registry.register(Arc::new(CountingObserver::default()));

    assert_eq!(registry.node_status_updated(&execution("pe-a", "ne-1")), 0);
    assert_eq!(registry.step_inputs_added("pe-a", "ne-1"), 0);
    assert_eq!(
        registry.plan_status_updated(&Ambiance::new("pe-a", "plan-1"), Status::Aborted),
        0
    );
}
