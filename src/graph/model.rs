//! In-memory execution topology served to visualization clients.

use crate::constants::Status;
use crate::models::{
    Ambiance, ExecutableResponse, ExecutionMode, FailureInfo, InterruptEffect, NodeExecution,
    NodeRunInfo, SkipInfo, SkipType, UnitProgress,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One node execution as a graph vertex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphVertex {
    pub uuid: String,
    pub ambiance: Ambiance,
    pub plan_node_id: String,
    pub identifier: String,
    pub name: String,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub initial_wait_duration_ms: Option<i64>,
    pub last_updated_at: i64,
    pub step_type: String,
    pub status: Status,
    pub failure_info: Option<FailureInfo>,
    pub skip_info: Option<SkipInfo>,
    pub node_run_info: Option<NodeRunInfo>,
    pub step_parameters: Value,
    pub mode: ExecutionMode,
    pub executable_responses: Vec<ExecutableResponse>,
    pub interrupt_histories: Vec<InterruptEffect>,
    pub retry_ids: Vec<String>,
    pub skip_type: SkipType,
    pub outcomes: HashMap<String, Value>,
    pub progress_data: Option<Value>,
    pub unit_progresses: Vec<UnitProgress>,
    pub step_details: HashMap<String, Value>,
}

impl From<&NodeExecution> for GraphVertex {
    fn from(execution: &NodeExecution) -> Self {
        Self {
            uuid: execution.uuid.clone(),
            ambiance: execution.ambiance.clone(),
            plan_node_id: execution.plan_node_id.clone(),
            identifier: execution.identifier.clone(),
            name: execution.name.clone(),
            start_ts: execution.start_ts,
            end_ts: execution.end_ts,
            initial_wait_duration_ms: execution.initial_wait_duration_ms,
            last_updated_at: execution.last_updated_at,
            step_type: execution
                .ambiance
                .current_step_type()
                .map(|step_type| step_type.type_name.clone())
                .unwrap_or_default(),
            status: execution.status,
            failure_info: execution.failure_info.clone(),
            skip_info: execution.skip_info.clone(),
            node_run_info: execution.node_run_info.clone(),
            step_parameters: execution.step_parameters.clone(),
            mode: execution.mode,
            executable_responses: execution.executable_responses.clone(),
            interrupt_histories: execution.interrupt_histories.clone(),
            retry_ids: execution.retry_ids.clone(),
            skip_type: execution.skip_graph_type,
            outcomes: execution.outcomes.clone(),
            progress_data: execution.progress_data.clone(),
            unit_progresses: execution.unit_progresses.clone(),
            step_details: execution.step_details.clone(),
        }
    }
}

/// Outgoing links of a vertex: `edges` to its children, `next_ids` to its successor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeList {
    pub edges: Vec<String>,
    pub next_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationAdjacencyList {
    pub graph_vertex_map: HashMap<String, GraphVertex>,
    pub adjacency_map: HashMap<String, EdgeList>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EphemeralOrchestrationGraph {
    pub plan_execution_id: String,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub status: Status,
    pub root_node_ids: Vec<String>,
    pub adjacency_list: OrchestrationAdjacencyList,
}
