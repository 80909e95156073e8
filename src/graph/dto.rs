//! Client-facing projections of the orchestration graph. Enums are rendered as their wire
//! names; everything else is carried as-is.

use crate::models::{ExecutableResponse, InterruptEffect, NodeRunInfo, SkipInfo, UnitProgress};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDataDto {
    pub code: String,
    pub level: String,
    pub message: String,
    pub failure_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureInfoDto {
    pub message: String,
    pub failure_type_list: Vec<String>,
    pub response_messages: Vec<FailureDataDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyMetadataDto {
    pub current_iteration: i32,
    pub total_iterations: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDto {
    pub setup_id: String,
    pub runtime_id: String,
    pub identifier: String,
    pub retry_index: i32,
    pub step_type: String,
    pub step_category: String,
    pub group: Option<String>,
    pub node_type: String,
    pub start_ts: i64,
    pub skip_expression_chain: bool,
    pub original_identifier: Option<String>,
    pub strategy_metadata: Option<StrategyMetadataDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbianceDto {
    pub plan_execution_id: String,
    pub plan_id: String,
    pub stage_execution_id: Option<String>,
    pub setup_abstractions: HashMap<String, String>,
    pub levels: Vec<LevelDto>,
    pub expression_functor_token: i64,
    pub start_ts: i64,
    pub run_sequence: i32,
    pub pipeline_identifier: String,
    pub trigger_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphVertexDto {
    pub uuid: String,
    pub ambiance: AmbianceDto,
    pub plan_node_id: String,
    pub identifier: String,
    pub name: String,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub initial_wait_duration_ms: Option<i64>,
    pub last_updated_at: i64,
    pub step_type: String,
    pub status: String,
    pub failure_info: Option<FailureInfoDto>,
    pub skip_info: Option<SkipInfo>,
    pub node_run_info: Option<NodeRunInfo>,
    pub step_parameters: Value,
    pub mode: String,
    pub executable_responses: Vec<ExecutableResponse>,
    pub interrupt_histories: Vec<InterruptEffect>,
    pub retry_ids: Vec<String>,
    pub skip_type: String,
    pub outcomes: HashMap<String, Value>,
    pub progress_data: Option<Value>,
    pub unit_progresses: Vec<UnitProgress>,
    pub step_details: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeListDto {
    pub edges: Vec<String>,
    pub next_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationAdjacencyListDto {
    pub graph_vertex_map: HashMap<String, GraphVertexDto>,
    pub adjacency_map: HashMap<String, EdgeListDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationGraphDto {
    pub plan_execution_id: String,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub status: String,
    pub root_node_ids: Vec<String>,
    pub adjacency_list: OrchestrationAdjacencyListDto,
}
