//! # Plan Creation Response
//!
//! The accumulator of a plan-creation pass: plan nodes, not-yet-expanded YAML dependencies,
//! an optional starting node, a context map and the visualization layout.
//!
//! ## Invariants
//!
//! - A node id is never present in both `nodes` and `dependencies`. Adding a node evicts the
//!   same-id dependency; adding a dependency for an id that already has a node is a no-op.
//!   Both maps are private so the pair is always updated together.
//! - Merging unions nodes and dependencies (last writer wins per key), keeps the first value
//!   of every context key, and fails without modifying `self` when the starting node ids
//!   (of the response or of its layout) disagree.

use super::errors::PlanCreationResult;
use super::layout::{check_starting_node, GraphLayoutResponse};
use super::node::PlanNode;
use crate::yaml::YamlField;
use serde_json::Value;
use std::collections::HashMap;

/// An unresolved YAML subtree waiting for a plan creator
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    field: YamlField,
    metadata: HashMap<String, Value>,
}

impl Dependency {
    pub fn new(field: YamlField) -> Self {
        Self {
            field,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(field: YamlField, metadata: HashMap<String, Value>) -> Self {
        Self { field, metadata }
    }

    pub fn field(&self) -> &YamlField {
        &self.field
    }

    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn node_id(&self) -> &str {
        self.field.node().uuid()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlanCreationResponse {
    nodes: HashMap<String, PlanNode>,
    dependencies: HashMap<String, Dependency>,
    starting_node_id: Option<String>,
    context: HashMap<String, Value>,
    graph_layout: GraphLayoutResponse,
}

impl PlanCreationResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_node(node: PlanNode) -> Self {
        let mut response = Self::new();
        response.add_node(node);
        response
    }

    pub fn from_dependency(dependency: Dependency) -> Self {
        let mut response = Self::new();
        response.add_dependency(dependency);
        response
    }

    pub fn nodes(&self) -> &HashMap<String, PlanNode> {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&PlanNode> {
        self.nodes.get(id)
    }

    pub fn dependencies(&self) -> &HashMap<String, Dependency> {
        &self.dependencies
    }

    pub fn dependency(&self, id: &str) -> Option<&Dependency> {
        self.dependencies.get(id)
    }

    pub fn starting_node_id(&self) -> Option<&str> {
        self.starting_node_id.as_deref()
    }

    pub fn context(&self) -> &HashMap<String, Value> {
        &self.context
    }

    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    pub fn graph_layout(&self) -> &GraphLayoutResponse {
        &self.graph_layout
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.dependencies.is_empty()
            && self.starting_node_id.is_none()
            && self.context.is_empty()
            && self.graph_layout.is_empty()
    }

    /// Insert a node, evicting any same-id dependency
    pub fn add_node(&mut self, node: PlanNode) {
        let id = node.uuid().to_string();
        self.dependencies.remove(&id);
        self.nodes.insert(id, node);
    }

    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = PlanNode>) {
        for node in nodes {
            self.add_node(node);
        }
    }

    /// Insert a dependency keyed by its YAML node id; ignored when the node already exists.
    /// Returns whether the dependency was recorded.
    pub fn add_dependency(&mut self, dependency: Dependency) -> bool {
        let id = dependency.node_id().to_string();
        if self.nodes.contains_key(&id) {
            return false;
        }
        self.dependencies.insert(id, dependency);
        true
    }

    /// Drop a dependency that has been handed to a creator
    pub fn remove_dependency(&mut self, id: &str) -> Option<Dependency> {
        self.dependencies.remove(id)
    }

    /// Set the starting node; fails if a different one is already set
    pub fn set_starting_node_id(&mut self, id: impl Into<String>) -> PlanCreationResult<()> {
        let id = id.into();
        if id.is_empty() {
            return Ok(());
        }
        check_starting_node(self.starting_node_id.as_deref(), Some(&id))?;
        self.starting_node_id = Some(id);
        Ok(())
    }

    /// First write wins: an existing key is never overwritten
    pub fn put_context_value(&mut self, key: impl Into<String>, value: Value) {
        self.context.entry(key.into()).or_insert(value);
    }

    pub fn graph_layout_mut(&mut self) -> &mut GraphLayoutResponse {
        &mut self.graph_layout
    }

    /// Fold `other` into `self`. On error `self` is left untouched.
    pub fn merge(&mut self, other: PlanCreationResponse) -> PlanCreationResult<()> {
        check_starting_node(
            self.starting_node_id.as_deref(),
            other.starting_node_id.as_deref(),
        )?;
        self.graph_layout.check_mergeable(&other.graph_layout)?;

        let PlanCreationResponse {
            nodes,
            dependencies,
            starting_node_id,
            context,
            graph_layout,
        } = other;

        if self.starting_node_id.is_none() {
            self.starting_node_id = starting_node_id.filter(|id| !id.is_empty());
        }
        self.add_nodes(nodes.into_values());
        for dependency in dependencies.into_values() {
            self.add_dependency(dependency);
        }
        for (key, value) in context {
            self.put_context_value(key, value);
        }
        self.graph_layout.merge(graph_layout)
    }

    /// Merge a sequence of responses into a fresh one, stopping at the first conflict
    pub fn merge_all(
        responses: impl IntoIterator<Item = PlanCreationResponse>,
    ) -> PlanCreationResult<PlanCreationResponse> {
        let mut merged = PlanCreationResponse::new();
        for response in responses {
            merged.merge(response)?;
        }
        Ok(merged)
    }

    /// Split into the owned parts once creation is finished
    pub fn into_parts(self) -> PlanCreationParts {
        PlanCreationParts {
            nodes: self.nodes,
            dependencies: self.dependencies,
            starting_node_id: self.starting_node_id,
            context: self.context,
            graph_layout: self.graph_layout,
        }
    }
}

pub struct PlanCreationParts {
    pub nodes: HashMap<String, PlanNode>,
    pub dependencies: HashMap<String, Dependency>,
    pub starting_node_id: Option<String>,
    pub context: HashMap<String, Value>,
    pub graph_layout: GraphLayoutResponse,
}
