use super::dto::OrchestrationGraphDto;
use super::model::{EdgeList, EphemeralOrchestrationGraph, GraphVertex, OrchestrationAdjacencyList};
use crate::constants::Status;
use crate::models::NodeExecution;
use std::collections::HashMap;
use tracing::debug;

/// Builds the adjacency-list graph of a plan execution from its node executions.
///
/// Vertices are the current executions (superseded retries are left out). A vertex's `edges`
/// are its children ordered by start time, its `next_ids` the execution that followed it.
/// Children of a superseded attempt hang off the execution that retried it. Roots are
/// executions with neither a parent nor a predecessor, plus any whose parent is not in the
/// graph at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphGenerator;

impl GraphGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(
        &self,
        plan_execution_id: &str,
        status: Status,
        node_executions: &[NodeExecution],
    ) -> EphemeralOrchestrationGraph {
        let mut current: Vec<&NodeExecution> = node_executions
            .iter()
            .filter(|execution| {
                !execution.old_retry && execution.plan_execution_id() == plan_execution_id
            })
            .collect();
        current.sort_by(|a, b| {
            a.start_ts
                .cmp(&b.start_ts)
                .then_with(|| a.uuid.cmp(&b.uuid))
        });

        let mut adjacency_map: HashMap<String, EdgeList> = current
            .iter()
            .map(|execution| (execution.uuid.clone(), EdgeList::default()))
            .collect();
        // Superseded attempt -> the execution that retried it
        let retried_by: HashMap<&str, &str> = current
            .iter()
            .flat_map(|execution| {
                execution
                    .retry_ids
                    .iter()
                    .map(move |retry_id| (retry_id.as_str(), execution.uuid.as_str()))
            })
            .collect();
        let mut root_node_ids = Vec::new();

        for execution in &current {
            if let Some(next_id) = &execution.next_id {
                if let Some(edges) = adjacency_map.get_mut(&execution.uuid) {
                    edges.next_ids.push(next_id.clone());
                }
            }
            let parent_id = execution.parent_id.as_deref().map(|parent_id| {
                if adjacency_map.contains_key(parent_id) {
                    parent_id
                } else {
                    retried_by.get(parent_id).copied().unwrap_or(parent_id)
                }
            });
            match parent_id {
                Some(parent_id) if adjacency_map.contains_key(parent_id) => {
                    if let Some(parent) = adjacency_map.get_mut(parent_id) {
                        parent.edges.push(execution.uuid.clone());
                    }
                }
                // A parent outside the graph leaves the child unreachable otherwise
                Some(_) => root_node_ids.push(execution.uuid.clone()),
                None if execution.previous_id.is_none() => {
                    root_node_ids.push(execution.uuid.clone())
                }
                None => {}
            }
        }

        let start_ts = current.iter().filter_map(|execution| execution.start_ts).min();
        let end_ts = if status.is_final() {
            current.iter().filter_map(|execution| execution.end_ts).max()
        } else {
            None
        };

        debug!(
            plan_execution_id = %plan_execution_id,
            vertices = current.len(),
            roots = root_node_ids.len(),
            "Generated orchestration graph"
        );

        EphemeralOrchestrationGraph {
            plan_execution_id: plan_execution_id.to_string(),
            start_ts,
            end_ts,
            status,
            root_node_ids,
            adjacency_list: OrchestrationAdjacencyList {
                graph_vertex_map: current
                    .iter()
                    .map(|execution| (execution.uuid.clone(), GraphVertex::from(*execution)))
                    .collect(),
                adjacency_map,
            },
        }
    }

    /// [`generate`](Self::generate) projected straight to the client DTO
    pub fn generate_dto(
        &self,
        plan_execution_id: &str,
        status: Status,
        node_executions: &[NodeExecution],
    ) -> OrchestrationGraphDto {
        OrchestrationGraphDto::from(&self.generate(plan_execution_id, status, node_executions))
    }
}
