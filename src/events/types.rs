use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Days an event log row is kept before it expires
pub const DEFAULT_EVENT_LOG_TTL_DAYS: i64 = 14;

/// Kind of transition recorded in the orchestration event log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrchestrationEventType {
    NodeExecutionStart,
    NodeExecutionStatusUpdate,
    NodeExecutionUpdate,
    PlanExecutionStatusUpdate,
    StepDetailsUpdate,
    StepInputsUpdate,
}

impl OrchestrationEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestrationEventType::NodeExecutionStart => "NODE_EXECUTION_START",
            OrchestrationEventType::NodeExecutionStatusUpdate => "NODE_EXECUTION_STATUS_UPDATE",
            OrchestrationEventType::NodeExecutionUpdate => "NODE_EXECUTION_UPDATE",
            OrchestrationEventType::PlanExecutionStatusUpdate => "PLAN_EXECUTION_STATUS_UPDATE",
            OrchestrationEventType::StepDetailsUpdate => "STEP_DETAILS_UPDATE",
            OrchestrationEventType::StepInputsUpdate => "STEP_INPUTS_UPDATE",
        }
    }
}

impl fmt::Display for OrchestrationEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only record of one observed transition. Never mutated; removed once `valid_until`
/// has passed or when the plan execution is purged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationEventLog {
    pub id: String,
    pub plan_execution_id: String,
    pub node_execution_id: Option<String>,
    pub event_type: OrchestrationEventType,
    pub created_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl OrchestrationEventLog {
    pub fn new(
        plan_execution_id: impl Into<String>,
        node_execution_id: Option<String>,
        event_type: OrchestrationEventType,
        ttl: Duration,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            plan_execution_id: plan_execution_id.into(),
            node_execution_id,
            event_type,
            created_at,
            valid_until: created_at + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until <= now
    }
}

/// Signal telling visualization consumers to re-read the event log of a plan execution.
/// Carries no deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEventMessage {
    pub plan_execution_id: String,
    pub metadata: HashMap<String, String>,
    pub published_at: DateTime<Utc>,
}

impl LogEventMessage {
    pub fn new(plan_execution_id: impl Into<String>) -> Self {
        Self {
            plan_execution_id: plan_execution_id.into(),
            metadata: HashMap::new(),
            published_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
