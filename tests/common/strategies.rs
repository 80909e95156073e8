#![allow(dead_code)]

use super::builders::{dependency, plan_node};
use pipeline_core::plan::PlanCreationResponse;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Starting node id used by every response that sets one, so generated merges never conflict
pub const SHARED_STARTING_NODE: &str = "start";

/// Plain description of a response, generated instead of the response itself so failures
/// shrink to readable inputs
#[derive(Debug, Clone)]
pub struct ResponseShape {
    pub node_ids: BTreeSet<String>,
    pub dependency_ids: BTreeSet<String>,
    pub context: Vec<(String, i64)>,
    pub sets_starting_node: bool,
}

impl ResponseShape {
    pub fn build(&self) -> PlanCreationResponse {
        let mut response = PlanCreationResponse::new();
        for id in &self.dependency_ids {
            response.add_dependency(dependency(id));
        }
        for id in &self.node_ids {
            response.add_node(plan_node(id));
        }
        for (key, value) in &self.context {
            response.put_context_value(key.clone(), serde_json::json!(value));
        }
        if self.sets_starting_node {
            response
                .set_starting_node_id(SHARED_STARTING_NODE)
                .expect("fresh response accepts a starting node");
        }
        response
    }
}

/// Ids from a small pool so that nodes and dependencies of different responses collide
pub fn node_id_strategy() -> impl Strategy<Value = String> {
    "n[0-9]"
}

pub fn context_key_strategy() -> impl Strategy<Value = String> {
    "k[a-d]"
}

pub fn response_shape_strategy() -> impl Strategy<Value = ResponseShape> {
    (
        prop::collection::btree_set(node_id_strategy(), 0..5),
        prop::collection::btree_set(node_id_strategy(), 0..5),
        prop::collection::vec((context_key_strategy(), any::<i64>()), 0..4),
        any::<bool>(),
    )
        .prop_map(
            |(node_ids, dependency_ids, context, sets_starting_node)| ResponseShape {
                node_ids,
                dependency_ids,
                context,
                sets_starting_node,
            },
        )
}

/// Comparable summary of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSummary {
    pub node_ids: BTreeSet<String>,
    pub dependency_ids: BTreeSet<String>,
    pub context: BTreeMap<String, serde_json::Value>,
    pub starting_node_id: Option<String>,
}

pub fn summarize(response: &PlanCreationResponse) -> ResponseSummary {
    ResponseSummary {
        node_ids: response.nodes().keys().cloned().collect(),
        dependency_ids: response.dependencies().keys().cloned().collect(),
        context: response
            .context()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        starting_node_id: response.starting_node_id().map(str::to_string),
    }
}
