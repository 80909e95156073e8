//! # Built-in Plan Creators
//!
//! Creators for the execution section of a pipeline:
//!
//! - [`ExecutionPlanCreator`] (`execution`): execution node, steps node, rollback section
//! - [`StepPlanCreator`] (`step`, any type): leaf step nodes with failure-strategy advisers
//! - [`ParallelPlanCreator`] (`parallel`): fork over its children
//! - [`StepGroupPlanCreator`] (`stepGroup`): chained children plus a local rollback section
//!
//! [`RollbackPlanCreator`] is not registered for a field; the execution creator calls it
//! directly for `rollbackSteps`.
//!
//! Composite creators never walk YAML parents. Instead each dependency they emit carries
//! metadata (`nextSiblingId`, `stageRollbackNodeId`, `stepGroupRollbackNodeId`) that the child
//! creator reads to wire its advisers.

mod execution;
mod parallel;
mod rollback;
mod step;
mod step_group;
mod strategies;

pub use execution::ExecutionPlanCreator;
pub use parallel::ParallelPlanCreator;
pub use rollback::RollbackPlanCreator;
pub use step::{facilitator_for_step_type, StepPlanCreator};
pub use step_group::StepGroupPlanCreator;
pub use strategies::adviser_obtainments_for_failure_strategies;

use super::creator::PartialPlanCreator;
use super::errors::{PlanCreationError, PlanCreationResult};
use super::layout::{EdgeLayoutList, GraphLayoutNode, GraphLayoutResponse};
use super::obtainment::{ChildFacilitatorParameters, FacilitatorObtainment, FacilitatorType};
use super::response::Dependency;
use crate::constants::{dependency_metadata, yaml_fields};
use crate::yaml::{YamlField, YamlNode};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub fn default_creators() -> Vec<Arc<dyn PartialPlanCreator>> {
    vec![
        Arc::new(ExecutionPlanCreator::new()),
        Arc::new(StepPlanCreator::new()),
        Arc::new(ParallelPlanCreator::new()),
        Arc::new(StepGroupPlanCreator::new()),
    ]
}

/// The wrapped fields of a step list such as `- step: {...}` / `- parallel: [...]`
pub(crate) fn element_fields(list: &YamlNode) -> PlanCreationResult<Vec<YamlField>> {
    list.as_array()
        .into_iter()
        .map(|element| {
            let field = element
                .first_field()
                .ok_or_else(|| PlanCreationError::InvalidYaml {
                    node_id: element.uuid().to_string(),
                    message: "step list element is empty".to_string(),
                })?;
            match field.name() {
                yaml_fields::STEP | yaml_fields::PARALLEL | yaml_fields::STEP_GROUP => Ok(field),
                other => Err(PlanCreationError::InvalidYaml {
                    node_id: element.uuid().to_string(),
                    message: format!("unsupported step list element '{other}'"),
                }),
            }
        })
        .collect()
}

/// One dependency per field, each pointing at its successor through `nextSiblingId`
pub(crate) fn chained_dependencies(
    fields: &[YamlField],
    inherited: &HashMap<String, Value>,
) -> Vec<Dependency> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let mut metadata = inherited.clone();
            metadata.remove(dependency_metadata::NEXT_SIBLING_ID);
            if let Some(next) = fields.get(index + 1) {
                metadata.insert(
                    dependency_metadata::NEXT_SIBLING_ID.to_string(),
                    Value::String(next.node().uuid().to_string()),
                );
            }
            Dependency::with_metadata(field.clone(), metadata)
        })
        .collect()
}

/// Metadata a composite hands to its children: everything but its own sibling link
pub(crate) fn inherited_metadata(metadata: &HashMap<String, Value>) -> HashMap<String, Value> {
    let mut inherited = metadata.clone();
    inherited.remove(dependency_metadata::NEXT_SIBLING_ID);
    inherited
}

pub(crate) fn child_facilitator(
    node_id: &str,
    child_node_id: &str,
) -> PlanCreationResult<FacilitatorObtainment> {
    FacilitatorObtainment::with_parameters(
        FacilitatorType::Child,
        &ChildFacilitatorParameters {
            child_node_id: child_node_id.to_string(),
        },
    )
    .map_err(|e| serialization_error(node_id, e))
}

pub(crate) fn serialization_error(node_id: &str, error: serde_json::Error) -> PlanCreationError {
    PlanCreationError::Serialization {
        node_id: node_id.to_string(),
        reason: error.to_string(),
    }
}

/// Layout nodes for a step list. Chained lists link each element to the next; parallel
/// children are laid out side by side.
pub(crate) fn add_layout_nodes(
    fields: &[YamlField],
    chained: bool,
    layout: &mut GraphLayoutResponse,
) -> PlanCreationResult<()> {
    for (index, field) in fields.iter().enumerate() {
        let node = field.node();
        let next_ids = match fields.get(index + 1) {
            Some(next) if chained => vec![next.node().uuid().to_string()],
            _ => Vec::new(),
        };

        let (children, children_chained, node_type, node_group) = match field.name() {
            yaml_fields::PARALLEL => (
                element_fields(node)?,
                false,
                "parallel".to_string(),
                "PARALLEL",
            ),
            yaml_fields::STEP_GROUP => (
                match node.get_field(yaml_fields::STEPS) {
                    Some(steps) => element_fields(steps.node())?,
                    None => Vec::new(),
                },
                true,
                "StepGroup".to_string(),
                "STEP_GROUP",
            ),
            _ => (
                Vec::new(),
                false,
                node.node_type().unwrap_or_default(),
                "STEP",
            ),
        };

        let identifier = node.identifier().unwrap_or_else(|| field.name().to_string());
        layout.add_layout_node(GraphLayoutNode {
            node_uuid: node.uuid().to_string(),
            node_type,
            name: node.name().unwrap_or_else(|| identifier.clone()),
            node_identifier: identifier,
            node_group: node_group.to_string(),
            edge_layout_list: EdgeLayoutList {
                current_node_children: children
                    .iter()
                    .map(|child| child.node().uuid().to_string())
                    .collect(),
                next_ids,
            },
        });
        add_layout_nodes(&children, children_chained, layout)?;
    }
    Ok(())
}
