use super::ambiance::Ambiance;
use super::failure::FailureInfo;
use super::step_type::SkipType;
use crate::constants::Status;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a node's execution is carried out, as chosen by its facilitator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    Child,
    Children,
    ChildChain,
    Task,
    TaskChain,
    Async,
    AsyncChain,
    Sync,
    Barrier,
    Constraint,
    Wait,
}

impl ExecutionMode {
    /// Modes that run leaf step logic (as opposed to delegating to children)
    pub fn is_executable_step(&self) -> bool {
        matches!(
            self,
            ExecutionMode::Task
                | ExecutionMode::TaskChain
                | ExecutionMode::Async
                | ExecutionMode::AsyncChain
                | ExecutionMode::Sync
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterruptType {
    Abort,
    AbortAll,
    Pause,
    Resume,
    Retry,
    MarkSuccess,
    MarkFailed,
    MarkExpired,
    Ignore,
    StageRollback,
    StepGroupRollback,
    CustomFailure,
    ProceedWithDefault,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterruptConfig {
    pub issued_by: String,
    pub issued_at: i64,
    pub metadata: HashMap<String, String>,
}

/// An interrupt that took effect on a node execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterruptEffect {
    pub interrupt_id: String,
    pub took_effect_at: i64,
    pub interrupt_type: InterruptType,
    pub interrupt_config: InterruptConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipInfo {
    pub skip_condition: String,
    pub evaluated_condition: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRunInfo {
    pub when_condition: String,
    pub evaluated_condition: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitProgress {
    pub unit_name: String,
    pub status: String,
    pub start_time: i64,
    pub end_time: i64,
}

/// What a facilitator handed back when it started a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutableResponse {
    Async {
        callback_ids: Vec<String>,
    },
    Task {
        task_id: String,
        task_category: String,
    },
    TaskChain {
        task_id: String,
        chain_end: bool,
    },
    Child {
        child_node_id: String,
    },
    Children {
        child_node_ids: Vec<String>,
    },
    Sync,
}

/// Runtime record of one execution of a plan node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecution {
    pub uuid: String,
    pub ambiance: Ambiance,
    pub plan_node_id: String,
    pub identifier: String,
    pub name: String,
    pub status: Status,
    pub mode: ExecutionMode,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub initial_wait_duration_ms: Option<i64>,
    pub last_updated_at: i64,
    pub failure_info: Option<FailureInfo>,
    pub skip_info: Option<SkipInfo>,
    pub node_run_info: Option<NodeRunInfo>,
    pub interrupt_histories: Vec<InterruptEffect>,
    pub executable_responses: Vec<ExecutableResponse>,
    pub retry_ids: Vec<String>,
    pub old_retry: bool,
    pub parent_id: Option<String>,
    pub previous_id: Option<String>,
    pub next_id: Option<String>,
    pub step_parameters: serde_json::Value,
    pub skip_graph_type: SkipType,
    pub outcomes: HashMap<String, serde_json::Value>,
    pub progress_data: Option<serde_json::Value>,
    pub unit_progresses: Vec<UnitProgress>,
    pub step_details: HashMap<String, serde_json::Value>,
}

impl NodeExecution {
    /// A freshly started execution; the node ids come from the ambiance's current level
    pub fn started(ambiance: Ambiance, name: impl Into<String>, mode: ExecutionMode) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let (uuid, plan_node_id, identifier) = match ambiance.current_level() {
            Some(level) => (
                level.runtime_id.clone(),
                level.setup_id.clone(),
                level.identifier.clone(),
            ),
            None => (String::new(), String::new(), String::new()),
        };
        Self {
            uuid,
            ambiance,
            plan_node_id,
            identifier,
            name: name.into(),
            status: Status::Running,
            mode,
            start_ts: Some(now),
            end_ts: None,
            initial_wait_duration_ms: None,
            last_updated_at: now,
            failure_info: None,
            skip_info: None,
            node_run_info: None,
            interrupt_histories: Vec::new(),
            executable_responses: Vec::new(),
            retry_ids: Vec::new(),
            old_retry: false,
            parent_id: None,
            previous_id: None,
            next_id: None,
            step_parameters: serde_json::Value::Null,
            skip_graph_type: SkipType::Noop,
            outcomes: HashMap::new(),
            progress_data: None,
            unit_progresses: Vec::new(),
            step_details: HashMap::new(),
        }
    }

    pub fn plan_execution_id(&self) -> &str {
        &self.ambiance.plan_execution_id
    }

    pub fn has_failure_info(&self) -> bool {
        self.failure_info.as_ref().is_some_and(|info| !info.is_empty())
    }
}
