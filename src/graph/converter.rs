//! Pure, lossless conversions from the graph model to its DTOs.

use super::dto::{
    AmbianceDto, EdgeListDto, FailureDataDto, FailureInfoDto, GraphVertexDto, LevelDto,
    OrchestrationAdjacencyListDto, OrchestrationGraphDto, StrategyMetadataDto,
};
use super::model::{EdgeList, EphemeralOrchestrationGraph, GraphVertex, OrchestrationAdjacencyList};
use crate::models::{Ambiance, FailureData, FailureInfo, Level, StrategyMetadata};
use serde::Serialize;

/// Serialized name of a unit enum variant, e.g. `SKIP_NODE`
fn wire_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => name,
        _ => String::new(),
    }
}

/// `None` stays `None`
pub fn failure_info_dto(failure_info: Option<&FailureInfo>) -> Option<FailureInfoDto> {
    failure_info.map(FailureInfoDto::from)
}

impl From<&FailureData> for FailureDataDto {
    fn from(data: &FailureData) -> Self {
        Self {
            code: data.code.clone(),
            level: data.level.clone(),
            message: data.message.clone(),
            failure_types: data.failure_types.iter().map(wire_name).collect(),
        }
    }
}

impl From<&FailureInfo> for FailureInfoDto {
    fn from(info: &FailureInfo) -> Self {
        Self {
            message: info.error_message.clone(),
            failure_type_list: info.failure_types.iter().map(wire_name).collect(),
            response_messages: info.failure_data.iter().map(FailureDataDto::from).collect(),
        }
    }
}

impl From<&StrategyMetadata> for StrategyMetadataDto {
    fn from(metadata: &StrategyMetadata) -> Self {
        Self {
            current_iteration: metadata.current_iteration,
            total_iterations: metadata.total_iterations,
        }
    }
}

impl From<&Level> for LevelDto {
    fn from(level: &Level) -> Self {
        Self {
            setup_id: level.setup_id.clone(),
            runtime_id: level.runtime_id.clone(),
            identifier: level.identifier.clone(),
            retry_index: level.retry_index,
            step_type: level.step_type.type_name.clone(),
            step_category: wire_name(&level.step_type.step_category),
            group: level.group.map(|group| group.as_str().to_string()),
            node_type: level.node_type.clone(),
            start_ts: level.start_ts,
            skip_expression_chain: level.skip_expression_chain,
            original_identifier: level.original_identifier.clone(),
            strategy_metadata: level.strategy_metadata.as_ref().map(StrategyMetadataDto::from),
        }
    }
}

impl From<&Ambiance> for AmbianceDto {
    fn from(ambiance: &Ambiance) -> Self {
        Self {
            plan_execution_id: ambiance.plan_execution_id.clone(),
            plan_id: ambiance.plan_id.clone(),
            stage_execution_id: ambiance.stage_execution_id.clone(),
            setup_abstractions: ambiance.setup_abstractions.clone(),
            levels: ambiance.levels.iter().map(LevelDto::from).collect(),
            expression_functor_token: ambiance.expression_functor_token,
            start_ts: ambiance.start_ts,
            run_sequence: ambiance.metadata.run_sequence,
            pipeline_identifier: ambiance.metadata.pipeline_identifier.clone(),
            trigger_type: ambiance.metadata.trigger_type.clone(),
        }
    }
}

impl From<&GraphVertex> for GraphVertexDto {
    fn from(vertex: &GraphVertex) -> Self {
        Self {
            uuid: vertex.uuid.clone(),
            ambiance: AmbianceDto::from(&vertex.ambiance),
            plan_node_id: vertex.plan_node_id.clone(),
            identifier: vertex.identifier.clone(),
            name: vertex.name.clone(),
            start_ts: vertex.start_ts,
            end_ts: vertex.end_ts,
            initial_wait_duration_ms: vertex.initial_wait_duration_ms,
            last_updated_at: vertex.last_updated_at,
            step_type: vertex.step_type.clone(),
            status: vertex.status.as_str().to_string(),
            failure_info: failure_info_dto(vertex.failure_info.as_ref()),
            skip_info: vertex.skip_info.clone(),
            node_run_info: vertex.node_run_info.clone(),
            step_parameters: vertex.step_parameters.clone(),
            mode: wire_name(&vertex.mode),
            executable_responses: vertex.executable_responses.clone(),
            interrupt_histories: vertex.interrupt_histories.clone(),
            retry_ids: vertex.retry_ids.clone(),
            skip_type: wire_name(&vertex.skip_type),
            outcomes: vertex.outcomes.clone(),
            progress_data: vertex.progress_data.clone(),
            unit_progresses: vertex.unit_progresses.clone(),
            step_details: vertex.step_details.clone(),
        }
    }
}

impl From<&EdgeList> for EdgeListDto {
    fn from(edges: &EdgeList) -> Self {
        Self {
            edges: edges.edges.clone(),
            next_ids: edges.next_ids.clone(),
        }
    }
}

impl From<&OrchestrationAdjacencyList> for OrchestrationAdjacencyListDto {
    fn from(list: &OrchestrationAdjacencyList) -> Self {
        Self {
            graph_vertex_map: list
                .graph_vertex_map
                .iter()
                .map(|(id, vertex)| (id.clone(), GraphVertexDto::from(vertex)))
                .collect(),
            adjacency_map: list
                .adjacency_map
                .iter()
                .map(|(id, edges)| (id.clone(), EdgeListDto::from(edges)))
                .collect(),
        }
    }
}

impl From<&EphemeralOrchestrationGraph> for OrchestrationGraphDto {
    fn from(graph: &EphemeralOrchestrationGraph) -> Self {
        Self {
            plan_execution_id: graph.plan_execution_id.clone(),
            start_ts: graph.start_ts,
            end_ts: graph.end_ts,
            status: graph.status.as_str().to_string(),
            root_node_ids: graph.root_node_ids.clone(),
            adjacency_list: OrchestrationAdjacencyListDto::from(&graph.adjacency_list),
        }
    }
}
