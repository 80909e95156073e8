//! # Orchestration Core Bootstrap
//!
//! Wires every component of the core from one [`ConfigManager`]:
//!
//! - plan creator service with the built-in creators
//! - adviser registry with the built-in advisers, backed by an in-memory sweeping-output service
//! - node advise helper with its queue processor spawned on the current Tokio runtime
//! - event log store, batch counter, broadcast log-event producer and log publisher
//! - observer registry with the log publisher and the sweeping-output service registered, so
//!   finished plan executions release their counters and outputs
//! - redelivery sweeper and graph generator

use crate::advise::{
    AdviseQueueHandle, AdviseQueueStats, AdviserRegistry, InMemorySweepingOutputService,
    NodeAdviseHelper, RollbackExecutableUtility, SdkResponseEventPublisher,
};
use crate::config::ConfigManager;
use crate::events::{
    BroadcastLogEventProducer, InMemoryBatchCounter, InMemoryOrchestrationEventLogStore,
    LogPublisherStats, ObserverRegistry, OrchestrationLogPublisher, OrchestrationLogSweeper,
};
use crate::graph::GraphGenerator;
use crate::plan::PlanCreatorService;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Snapshot of the running core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStatus {
    pub environment: String,
    pub observers: usize,
    pub advise_queue: AdviseQueueStats,
    pub event_log: LogPublisherStats,
    pub log_event_subscribers: usize,
}

pub struct OrchestrationCore {
    config_manager: Arc<ConfigManager>,
    plan_creator_service: PlanCreatorService,
    adviser_registry: Arc<AdviserRegistry>,
    sweeping_output: Arc<InMemorySweepingOutputService>,
    rollback_utility: RollbackExecutableUtility,
    advise_queue: AdviseQueueHandle,
    advise_task: JoinHandle<()>,
    log_store: Arc<InMemoryOrchestrationEventLogStore>,
    log_producer: Arc<BroadcastLogEventProducer>,
    log_publisher: Arc<OrchestrationLogPublisher>,
    observers: Arc<ObserverRegistry>,
    sweeper: OrchestrationLogSweeper,
    graph_generator: GraphGenerator,
}

impl OrchestrationCore {
    /// Build and start the core. Must be called from within a Tokio runtime; advise decisions
    /// are delivered to `sdk_response_publisher`.
    pub fn bootstrap(
        config_manager: Arc<ConfigManager>,
        sdk_response_publisher: Arc<dyn SdkResponseEventPublisher>,
    ) -> Self {
        let config = config_manager.config().clone();

        let plan_creator_service = PlanCreatorService::with_defaults(config.plan_creation.clone());

        let sweeping_output = Arc::new(InMemorySweepingOutputService::new());
        let adviser_registry = Arc::new(AdviserRegistry::with_defaults(sweeping_output.clone()));
        let rollback_utility = RollbackExecutableUtility::new(sweeping_output.clone());
        let (advise_queue, advise_task) =
            NodeAdviseHelper::new(adviser_registry.clone(), sdk_response_publisher)
                .spawn(config.advising.queue_capacity);

        let log_store = Arc::new(InMemoryOrchestrationEventLogStore::new());
        let log_producer = Arc::new(BroadcastLogEventProducer::new(
            config.event_log.producer_capacity,
        ));
        let log_publisher = Arc::new(OrchestrationLogPublisher::new(
            log_store.clone(),
            Arc::new(InMemoryBatchCounter::new()),
            log_producer.clone(),
            &config.event_log,
        ));
        let observers = Arc::new(ObserverRegistry::new());
        observers.register(log_publisher.clone());
        observers.register(sweeping_output.clone());
        let sweeper = OrchestrationLogSweeper::new(log_store.clone(), log_producer.clone());

        info!(
            environment = %config_manager.environment(),
            advisers = adviser_registry.len(),
            plan_creators = plan_creator_service.resolver().registry().len(),
            "🚀 BOOTSTRAP: Orchestration core started"
        );

        Self {
            config_manager,
            plan_creator_service,
            adviser_registry,
            sweeping_output,
            rollback_utility,
            advise_queue,
            advise_task,
            log_store,
            log_producer,
            log_publisher,
            observers,
            sweeper,
            graph_generator: GraphGenerator::new(),
        }
    }

    pub fn config_manager(&self) -> &Arc<ConfigManager> {
        &self.config_manager
    }

    pub fn plan_creator_service(&self) -> &PlanCreatorService {
        &self.plan_creator_service
    }

    pub fn adviser_registry(&self) -> &Arc<AdviserRegistry> {
        &self.adviser_registry
    }

    pub fn sweeping_output(&self) -> &Arc<InMemorySweepingOutputService> {
        &self.sweeping_output
    }

    pub fn rollback_utility(&self) -> &RollbackExecutableUtility {
        &self.rollback_utility
    }

    pub fn advise_queue(&self) -> &AdviseQueueHandle {
        &self.advise_queue
    }

    pub fn log_store(&self) -> &Arc<InMemoryOrchestrationEventLogStore> {
        &self.log_store
    }

    pub fn log_producer(&self) -> &Arc<BroadcastLogEventProducer> {
        &self.log_producer
    }

    pub fn log_publisher(&self) -> &Arc<OrchestrationLogPublisher> {
        &self.log_publisher
    }

    pub fn observers(&self) -> &Arc<ObserverRegistry> {
        &self.observers
    }

    pub fn sweeper(&self) -> &OrchestrationLogSweeper {
        &self.sweeper
    }

    pub fn graph_generator(&self) -> &GraphGenerator {
        &self.graph_generator
    }

    pub fn status(&self) -> CoreStatus {
        CoreStatus {
            environment: self.config_manager.environment().to_string(),
            observers: self.observers.len(),
            advise_queue: self.advise_queue.stats(),
            event_log: self.log_publisher.stats(),
            log_event_subscribers: self.log_producer.subscriber_count(),
        }
    }

    /// Close the advise queue and wait for queued events to be processed. Returns once every
    /// clone of the queue handle has been dropped.
    pub async fn shutdown(self) {
        let Self {
            advise_queue,
            advise_task,
            ..
        } = self;
        drop(advise_queue);
        if let Err(e) = advise_task.await {
            warn!(error = %e, "Advise processor ended abnormally");
        }
        info!("🛑 Orchestration core stopped");
    }
}
