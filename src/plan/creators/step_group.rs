use super::rollback::RollbackPlanCreator;
use super::strategies::adviser_obtainments_for_failure_strategies;
use super::{
    chained_dependencies, child_facilitator, element_fields, inherited_metadata,
    serialization_error,
};
use crate::advise::parameters::RollbackCustomAdviserParameters;
use crate::constants::{dependency_metadata, plan_ids, yaml_fields};
use crate::models::{FailureStrategyConfig, NodeGroup, StepCategory, StepType};
use crate::plan::context::PlanCreationContext;
use crate::plan::creator::PartialPlanCreator;
use crate::plan::errors::{PlanCreationError, PlanCreationResult};
use crate::plan::node::PlanNode;
use crate::plan::obtainment::{AdviserObtainment, AdviserType};
use crate::plan::response::PlanCreationResponse;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

/// Creator for `stepGroup`: chained children and an optional local rollback section.
///
/// The group node's first adviser is `ROLLBACK_CUSTOM`, so a child failure published with a
/// step-group rollback is routed to `<groupUuid>_stepGroupRollback`. Without a published
/// strategy the group's own failure strategies and `NEXT_STEP` apply.
#[derive(Debug, Default, Clone)]
pub struct StepGroupPlanCreator {
    rollback: RollbackPlanCreator,
}

impl StepGroupPlanCreator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PartialPlanCreator for StepGroupPlanCreator {
    fn name(&self) -> &'static str {
        "stepGroup"
    }

    fn supported_types(&self) -> HashMap<String, HashSet<String>> {
        HashMap::from([(yaml_fields::STEP_GROUP.to_string(), HashSet::new())])
    }

    async fn handle_node(
        &self,
        ctx: &PlanCreationContext,
    ) -> PlanCreationResult<PlanCreationResponse> {
        let field = ctx.current_field();
        let node = field.node();
        let node_id = node.uuid();

        let identifier = node
            .identifier()
            .ok_or_else(|| PlanCreationError::InvalidYaml {
                node_id: node_id.to_string(),
                message: "step group identifier is required".to_string(),
            })?;
        let children = match node.get_field(yaml_fields::STEPS) {
            Some(steps) => element_fields(steps.node())?,
            None => Vec::new(),
        };
        let first_child_id = children
            .first()
            .map(|child| child.node().uuid().to_string())
            .ok_or_else(|| PlanCreationError::EmptySteps {
                node_id: node_id.to_string(),
            })?;

        let mut inherited = inherited_metadata(ctx.dependency_metadata());
        let rollback_node_id = RollbackPlanCreator::step_group_rollback_node_id(node_id);
        let rollback = self.rollback.create_rollback_section(
            field,
            &rollback_node_id,
            &format!("{identifier}_rollback"),
            "Step Group Rollback",
            &inherited,
        )?;
        let has_rollback = !rollback.is_empty();
        if has_rollback {
            inherited.insert(
                dependency_metadata::STEP_GROUP_ROLLBACK_NODE_ID.to_string(),
                Value::String(rollback_node_id.clone()),
            );
        }

        let failure_strategies: Vec<FailureStrategyConfig> =
            match node.get_field(yaml_fields::FAILURE_STRATEGIES) {
                Some(strategies) => serde_json::from_value(strategies.node().to_json()?)
                    .map_err(|e| PlanCreationError::InvalidYaml {
                        node_id: node_id.to_string(),
                        message: format!("invalid failure strategies on '{identifier}': {e}"),
                    })?,
                None => Vec::new(),
            };
        let next_sibling_id = ctx
            .dependency_metadata()
            .get(dependency_metadata::NEXT_SIBLING_ID)
            .and_then(Value::as_str);

        let mut advisers = vec![AdviserObtainment::with_parameters(
            AdviserType::RollbackCustom,
            &RollbackCustomAdviserParameters::default(),
        )
        .map_err(|e| serialization_error(node_id, e))?];
        advisers.extend(adviser_obtainments_for_failure_strategies(
            node_id,
            &failure_strategies,
            next_sibling_id,
        )?);

        let mut step_parameters = json!({
            "identifier": identifier,
            "childNodeId": first_child_id,
        });
        if has_rollback {
            step_parameters["rollbackNodeId"] = Value::String(rollback_node_id);
        }

        let group_node = PlanNode::builder(
            node_id,
            identifier.clone(),
            StepType::new(plan_ids::STEP_GROUP, StepCategory::StepGroup),
        )
        .name(node.name().unwrap_or(identifier))
        .group(NodeGroup::StepGroup)
        .facilitator_obtainment(child_facilitator(node_id, &first_child_id)?)
        .adviser_obtainments(advisers)
        .step_parameters(step_parameters)
        .build();

        let mut response = PlanCreationResponse::from_node(group_node);
        for dependency in chained_dependencies(&children, &inherited) {
            response.add_dependency(dependency);
        }
        response.merge(rollback)?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::YamlUtils;

    const STEP_GROUP: &str = r#"
stepGroup:
  identifier: canary
  name: Canary
  steps:
    - step:
        identifier: deploy
        type: K8sCanaryDeploy
    - step:
        identifier: verify
        type: Verify
  rollbackSteps:
    - step:
        identifier: delete
        type: K8sCanaryDelete
"#;

    #[tokio::test]
    async fn test_step_group_wires_children_and_rollback() {
        let field = YamlUtils::read_tree(STEP_GROUP)
            .unwrap()
            .node()
            .get_field("stepGroup")
            .unwrap();
        let group_id = field.node().uuid().to_string();
        let response = StepGroupPlanCreator::new()
            .handle_node(&PlanCreationContext::new(field))
            .await
            .unwrap();

        let group = response.node(&group_id).unwrap();
        assert_eq!(group.group(), Some(NodeGroup::StepGroup));
        assert_eq!(group.name(), "Canary");
        assert_eq!(
            group.adviser_obtainments()[0].adviser_type,
            AdviserType::RollbackCustom
        );

        let rollback_id = format!("{group_id}_stepGroupRollback");
        assert!(response.node(&rollback_id).is_some());

        // Two children plus one rollback step
        assert_eq!(response.dependencies().len(), 3);
        let children_routed_to_rollback = response
            .dependencies()
            .values()
            .filter(|d| {
                d.metadata_str(dependency_metadata::STEP_GROUP_ROLLBACK_NODE_ID)
                    == Some(rollback_id.as_str())
            })
            .count();
        assert_eq!(children_routed_to_rollback, 2);
    }

    #[tokio::test]
    async fn test_step_group_without_steps_is_rejected() {
        let field = YamlUtils::read_tree("stepGroup:\n  identifier: g\n  steps: []\n")
            .unwrap()
            .node()
            .get_field("stepGroup")
            .unwrap();
        let err = StepGroupPlanCreator::new()
            .handle_node(&PlanCreationContext::new(field))
            .await
            .unwrap_err();
        assert!(matches!(err, PlanCreationError::EmptySteps { .. }));
    }
}
