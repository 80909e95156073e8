use super::{chained_dependencies, child_facilitator, element_fields, inherited_metadata};
use crate::constants::{dependency_metadata, plan_ids, yaml_fields};
use crate::models::{SkipType, StepCategory, StepType};
use crate::plan::errors::PlanCreationResult;
use crate::plan::node::PlanNode;
use crate::plan::response::PlanCreationResponse;
use crate::yaml::YamlField;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

/// Builds rollback sections: a section node delegating to the first rollback step, plus
/// chained dependencies for every rollback step.
#[derive(Debug, Default, Clone)]
pub struct RollbackPlanCreator;

impl RollbackPlanCreator {
    pub fn new() -> Self {
        Self
    }

    /// Id of the combined rollback section of a steps node
    pub fn combined_rollback_node_id(steps_node_id: &str) -> String {
        format!("{steps_node_id}{}", plan_ids::COMBINED_ROLLBACK_ID_SUFFIX)
    }

    /// Id of the rollback section of a step group
    pub fn step_group_rollback_node_id(step_group_id: &str) -> String {
        format!("{step_group_id}{}", plan_ids::STEP_GROUP_ROLLBACK_ID_SUFFIX)
    }

    /// Combined rollback section for `execution`'s `rollbackSteps`. Empty when there are none.
    pub fn create_plan_for_rollback(
        &self,
        execution: &YamlField,
        steps_node_id: &str,
        metadata: &HashMap<String, Value>,
    ) -> PlanCreationResult<PlanCreationResponse> {
        self.create_rollback_section(
            execution,
            &Self::combined_rollback_node_id(steps_node_id),
            "combinedRollback",
            "Rollback",
            metadata,
        )
    }

    /// Rollback section for the `rollbackSteps` of `owner` under `section_id`
    pub fn create_rollback_section(
        &self,
        owner: &YamlField,
        section_id: &str,
        identifier: &str,
        name: &str,
        metadata: &HashMap<String, Value>,
    ) -> PlanCreationResult<PlanCreationResponse> {
        let Some(rollback_steps) = owner.node().get_field(yaml_fields::ROLLBACK_STEPS) else {
            return Ok(PlanCreationResponse::new());
        };
        let fields = element_fields(rollback_steps.node())?;
        let Some(first) = fields.first() else {
            return Ok(PlanCreationResponse::new());
        };

        // A failing rollback step must not route back into a rollback section
        let mut inherited = inherited_metadata(metadata);
        inherited.remove(dependency_metadata::STAGE_ROLLBACK_NODE_ID);
        inherited.remove(dependency_metadata::STEP_GROUP_ROLLBACK_NODE_ID);

        let first_child_id = first.node().uuid();
        let section = PlanNode::builder(
            section_id,
            identifier,
            StepType::new(plan_ids::NG_SECTION, StepCategory::Step),
        )
        .name(name)
        .facilitator_obtainment(child_facilitator(section_id, first_child_id)?)
        .skip_graph_type(SkipType::SkipNode)
        .step_parameters(json!({ "childNodeId": first_child_id }))
        .build();

        let mut response = PlanCreationResponse::from_node(section);
        for dependency in chained_dependencies(&fields, &inherited) {
            response.add_dependency(dependency);
        }
        debug!(
            section_id,
            rollback_steps = fields.len(),
            "Created rollback section"
        );
        Ok(response)
    }
}
