//! Visualization topology produced alongside the executable plan.

use super::errors::{PlanCreationError, PlanCreationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeLayoutList {
    pub current_node_children: Vec<String>,
    pub next_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLayoutNode {
    pub node_uuid: String,
    pub node_type: String,
    pub node_identifier: String,
    pub name: String,
    pub node_group: String,
    pub edge_layout_list: EdgeLayoutList,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLayoutResponse {
    layout_nodes: HashMap<String, GraphLayoutNode>,
    starting_node_id: Option<String>,
}

impl GraphLayoutResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layout_nodes(&self) -> &HashMap<String, GraphLayoutNode> {
        &self.layout_nodes
    }

    pub fn starting_node_id(&self) -> Option<&str> {
        self.starting_node_id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.layout_nodes.is_empty() && self.starting_node_id.is_none()
    }

    pub fn add_layout_node(&mut self, node: GraphLayoutNode) {
        self.layout_nodes.insert(node.node_uuid.clone(), node);
    }

    pub fn set_starting_node_id(&mut self, id: impl Into<String>) -> PlanCreationResult<()> {
        let id = id.into();
        if id.is_empty() {
            return Ok(());
        }
        check_starting_node(self.starting_node_id.as_deref(), Some(&id))?;
        self.starting_node_id = Some(id);
        Ok(())
    }

    /// Verify `other` can be merged without touching `self`
    pub fn check_mergeable(&self, other: &GraphLayoutResponse) -> PlanCreationResult<()> {
        check_starting_node(
            self.starting_node_id.as_deref(),
            other.starting_node_id.as_deref(),
        )
    }

    /// Union the layout nodes; starting node ids must agree
    pub fn merge(&mut self, other: GraphLayoutResponse) -> PlanCreationResult<()> {
        self.check_mergeable(&other)?;
        if self.starting_node_id.is_none() {
            self.starting_node_id = other.starting_node_id;
        }
        self.layout_nodes.extend(other.layout_nodes);
        Ok(())
    }
}

/// Two starting node ids are compatible when either is unset or both are equal
pub(crate) fn check_starting_node(
    existing: Option<&str>,
    incoming: Option<&str>,
) -> PlanCreationResult<()> {
    if let (Some(existing), Some(incoming)) = (existing, incoming) {
        if !existing.is_empty() && !incoming.is_empty() && existing != incoming {
            return Err(PlanCreationError::StartingNodeConflict {
                existing: existing.to_string(),
                incoming: incoming.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_node(id: &str) -> GraphLayoutNode {
        GraphLayoutNode {
            node_uuid: id.to_string(),
            node_type: "ShellScript".to_string(),
            node_identifier: id.to_string(),
            name: id.to_string(),
            node_group: "STEP".to_string(),
            edge_layout_list: EdgeLayoutList::default(),
        }
    }

    #[test]
    fn test_merge_unions_nodes_and_adopts_starting_node() {
        let mut left = GraphLayoutResponse::new();
        left.add_layout_node(layout_node("a"));

        let mut right = GraphLayoutResponse::new();
        right.add_layout_node(layout_node("b"));
        right.set_starting_node_id("b").unwrap();

        left.merge(right).unwrap();
        assert_eq!(left.layout_nodes().len(), 2);
        assert_eq!(left.starting_node_id(), Some("b"));
    }

    #[test]
    fn test_merge_rejects_conflicting_starting_nodes() {
        let mut left = GraphLayoutResponse::new();
        left.set_starting_node_id("a").unwrap();
        let mut right = GraphLayoutResponse::new();
        right.set_starting_node_id("b").unwrap();

        let err = left.merge(right).unwrap_err();
        assert!(matches!(err, PlanCreationError::StartingNodeConflict { .. }));
        assert_eq!(left.starting_node_id(), Some("a"));
    }
}
