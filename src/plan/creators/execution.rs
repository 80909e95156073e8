//! Creator for the `execution` section.
//!
//! Produces the execution node (CHILD to the steps node), the steps node (CHILD to the first
//! step, with the rollback-aware `ROLLBACK_CUSTOM` adviser), one dependency per top-level step
//! and the combined rollback section when `rollbackSteps` is non-empty.

use super::rollback::RollbackPlanCreator;
use super::{
    add_layout_nodes, chained_dependencies, child_facilitator, element_fields,
    inherited_metadata, serialization_error,
};
use crate::advise::parameters::{NextStepAdviserParameters, RollbackCustomAdviserParameters};
use crate::constants::{context_keys, dependency_metadata, plan_ids, yaml_fields};
use crate::models::{NodeGroup, SkipType, StepCategory, StepType};
use crate::plan::context::PlanCreationContext;
use crate::plan::creator::PartialPlanCreator;
use crate::plan::errors::{PlanCreationError, PlanCreationResult};
use crate::plan::layout::GraphLayoutResponse;
use crate::plan::node::PlanNode;
use crate::plan::obtainment::{AdviserObtainment, AdviserType};
use crate::plan::response::PlanCreationResponse;
use crate::yaml::YamlField;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct ExecutionPlanCreator {
    rollback: RollbackPlanCreator,
}

impl ExecutionPlanCreator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses for everything below the execution node, in creation order: one per
    /// top-level step (keyed by step id), the steps node, then the combined rollback section.
    pub fn create_plan_for_children_nodes(
        &self,
        ctx: &PlanCreationContext,
        execution: &YamlField,
    ) -> PlanCreationResult<Vec<(String, PlanCreationResponse)>> {
        let execution_id = execution.node().uuid();
        let empty_steps = || PlanCreationError::EmptySteps {
            node_id: execution_id.to_string(),
        };

        let steps_field = execution
            .node()
            .get_field(yaml_fields::STEPS)
            .ok_or_else(empty_steps)?;
        let fields = element_fields(steps_field.node())?;
        let first_step_id = fields
            .first()
            .map(|field| field.node().uuid().to_string())
            .ok_or_else(empty_steps)?;
        let steps_node_id = steps_field.node().uuid().to_string();

        let mut inherited = inherited_metadata(ctx.dependency_metadata());
        let rollback = self
            .rollback
            .create_plan_for_rollback(execution, &steps_node_id, &inherited)?;
        let rollback_node_id = RollbackPlanCreator::combined_rollback_node_id(&steps_node_id);
        let has_rollback = !rollback.is_empty();
        if has_rollback {
            inherited.insert(
                dependency_metadata::STAGE_ROLLBACK_NODE_ID.to_string(),
                Value::String(rollback_node_id.clone()),
            );
        }

        let mut children = Vec::with_capacity(fields.len() + 2);
        for dependency in chained_dependencies(&fields, &inherited) {
            children.push((
                dependency.node_id().to_string(),
                PlanCreationResponse::from_dependency(dependency),
            ));
        }

        let mut step_parameters = json!({ "childNodeId": first_step_id });
        if has_rollback {
            step_parameters["rollbackNodeId"] = Value::String(rollback_node_id.clone());
        }
        let steps_node = PlanNode::builder(
            &steps_node_id,
            yaml_fields::STEPS,
            StepType::new(plan_ids::NG_SECTION_WITH_ROLLBACK_INFO, StepCategory::Step),
        )
        .name("Execution Steps")
        .facilitator_obtainment(child_facilitator(&steps_node_id, &first_step_id)?)
        .adviser_obtainment(
            AdviserObtainment::with_parameters(
                AdviserType::RollbackCustom,
                &RollbackCustomAdviserParameters::default(),
            )
            .map_err(|e| serialization_error(&steps_node_id, e))?,
        )
        .skip_graph_type(SkipType::SkipNode)
        .step_parameters(step_parameters)
        .build();

        let mut layout = GraphLayoutResponse::new();
        add_layout_nodes(&fields, true, &mut layout)?;
        layout.set_starting_node_id(first_step_id)?;

        let mut steps_response = PlanCreationResponse::from_node(steps_node);
        *steps_response.graph_layout_mut() = layout;
        children.push((steps_node_id, steps_response));

        if has_rollback {
            children.push((rollback_node_id, rollback));
        }
        Ok(children)
    }

    /// The execution node itself, delegating to the steps node
    pub fn create_plan_for_parent_node(
        &self,
        ctx: &PlanCreationContext,
        execution: &YamlField,
        steps_node_id: &str,
    ) -> PlanCreationResult<PlanNode> {
        let execution_id = execution.node().uuid();
        let mut builder = PlanNode::builder(
            execution_id,
            yaml_fields::EXECUTION,
            StepType::new(plan_ids::NG_SECTION, StepCategory::Step),
        )
        .name("Execution")
        .group(NodeGroup::Execution)
        .facilitator_obtainment(child_facilitator(execution_id, steps_node_id)?)
        .skip_graph_type(SkipType::SkipNode)
        .step_parameters(json!({ "childNodeId": steps_node_id }));

        if let Some(next) = ctx
            .dependency_metadata()
            .get(dependency_metadata::NEXT_SIBLING_ID)
            .and_then(Value::as_str)
        {
            builder = builder.adviser_obtainment(
                AdviserObtainment::with_parameters(
                    AdviserType::NextStep,
                    &NextStepAdviserParameters {
                        next_node_id: Some(next.to_string()),
                    },
                )
                .map_err(|e| serialization_error(execution_id, e))?,
            );
        }
        Ok(builder.build())
    }

    /// Full response for an execution section
    pub fn create_plan_for_execution(
        &self,
        ctx: &PlanCreationContext,
        execution: &YamlField,
    ) -> PlanCreationResult<PlanCreationResponse> {
        let steps_node_id = execution
            .node()
            .get_field(yaml_fields::STEPS)
            .map(|steps| steps.node().uuid().to_string())
            .ok_or_else(|| PlanCreationError::EmptySteps {
                node_id: execution.node().uuid().to_string(),
            })?;

        let children = self.create_plan_for_children_nodes(ctx, execution)?;
        let rollback_node_id = RollbackPlanCreator::combined_rollback_node_id(&steps_node_id);
        let has_rollback = children.iter().any(|(id, _)| *id == rollback_node_id);

        let mut response =
            PlanCreationResponse::merge_all(children.into_iter().map(|(_, child)| child))?;
        response.add_node(self.create_plan_for_parent_node(ctx, execution, &steps_node_id)?);
        response.put_context_value(
            context_keys::EXECUTION_NODE_ID,
            Value::String(execution.node().uuid().to_string()),
        );
        response.put_context_value(context_keys::STEPS_NODE_ID, Value::String(steps_node_id));
        response.put_context_value(context_keys::ROLLBACK_PLAN_PRESENT, Value::Bool(has_rollback));

        debug!(
            execution_id = execution.node().uuid(),
            nodes = response.nodes().len(),
            dependencies = response.dependencies().len(),
            "Created execution plan"
        );
        Ok(response)
    }
}

#[async_trait]
impl PartialPlanCreator for ExecutionPlanCreator {
    fn name(&self) -> &'static str {
        "execution"
    }

    fn supported_types(&self) -> HashMap<String, HashSet<String>> {
        HashMap::from([(yaml_fields::EXECUTION.to_string(), HashSet::new())])
    }

    async fn handle_node(
        &self,
        ctx: &PlanCreationContext,
    ) -> PlanCreationResult<PlanCreationResponse> {
        self.create_plan_for_execution(ctx, ctx.current_field())
    }
}
