use super::strategies::adviser_obtainments_for_failure_strategies;
use super::serialization_error;
use crate::constants::{dependency_metadata, yaml_fields};
use crate::models::{
    FailureStrategyAction, FailureStrategyConfig, NodeGroup, OnFailRollbackParameters,
    RollbackStrategy, StepElementParameters, StepType,
};
use crate::plan::context::PlanCreationContext;
use crate::plan::creator::PartialPlanCreator;
use crate::plan::errors::{PlanCreationError, PlanCreationResult};
use crate::plan::node::PlanNode;
use crate::plan::obtainment::{FacilitatorObtainment, FacilitatorType};
use crate::plan::response::PlanCreationResponse;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// How a step of the given type is executed
pub fn facilitator_for_step_type(step_type: &str) -> FacilitatorType {
    match step_type {
        "ShellScript" | "Http" | "Email" | "JiraCreate" | "JiraUpdate" => FacilitatorType::Task,
        "K8sRollingDeploy" | "K8sRollingRollback" | "K8sCanaryDeploy" | "K8sBlueGreenDeploy"
        | "HelmDeploy" | "TerraformPlan" | "TerraformApply" => FacilitatorType::TaskChain,
        "HarnessApproval" | "JiraApproval" | "ServiceNowApproval" | "CustomApproval" | "Wait" => {
            FacilitatorType::Async
        }
        "Barrier" => FacilitatorType::Barrier,
        _ => FacilitatorType::Sync,
    }
}

/// Creator for leaf steps of any type
#[derive(Debug, Default, Clone)]
pub struct StepPlanCreator;

impl StepPlanCreator {
    pub fn new() -> Self {
        Self
    }

    fn rollback_parameters(
        ctx: &PlanCreationContext,
        strategies: &[FailureStrategyConfig],
    ) -> OnFailRollbackParameters {
        let strategy = strategies
            .iter()
            .find_map(|s| rollback_strategy_of(&s.on_failure.action))
            .unwrap_or_default();

        let mut strategy_to_uuid = HashMap::new();
        if let Some(id) = ctx.lookup_str(dependency_metadata::STAGE_ROLLBACK_NODE_ID) {
            strategy_to_uuid.insert(RollbackStrategy::StageRollback, id.to_string());
        }
        if let Some(id) = ctx.lookup_str(dependency_metadata::STEP_GROUP_ROLLBACK_NODE_ID) {
            strategy_to_uuid.insert(RollbackStrategy::StepGroupRollback, id.to_string());
        }
        OnFailRollbackParameters {
            strategy,
            strategy_to_uuid,
        }
    }
}

/// Rollback selected by an action, directly or as its follow-up
fn rollback_strategy_of(action: &FailureStrategyAction) -> Option<RollbackStrategy> {
    action.rollback_strategy().or_else(|| match action {
        FailureStrategyAction::Retry(spec) => spec.on_retry_failure.action.rollback_strategy(),
        FailureStrategyAction::ManualIntervention(spec) => {
            spec.on_timeout.action.rollback_strategy()
        }
        _ => None,
    })
}

#[async_trait]
impl PartialPlanCreator for StepPlanCreator {
    fn name(&self) -> &'static str {
        "step"
    }

    fn supported_types(&self) -> HashMap<String, HashSet<String>> {
        HashMap::from([(yaml_fields::STEP.to_string(), HashSet::new())])
    }

    async fn handle_node(
        &self,
        ctx: &PlanCreationContext,
    ) -> PlanCreationResult<PlanCreationResponse> {
        let node = ctx.current_field().node();
        let node_id = node.uuid();
        let invalid = |message: String| PlanCreationError::InvalidYaml {
            node_id: node_id.to_string(),
            message,
        };

        let identifier = node
            .identifier()
            .ok_or_else(|| invalid("step identifier is required".to_string()))?;
        let step_type = node
            .node_type()
            .ok_or_else(|| invalid(format!("step '{identifier}' has no type")))?;
        let name = node.name().unwrap_or_else(|| identifier.clone());

        let failure_strategies: Vec<FailureStrategyConfig> =
            match node.get_field(yaml_fields::FAILURE_STRATEGIES) {
                Some(field) => serde_json::from_value(field.node().to_json()?).map_err(|e| {
                    invalid(format!("invalid failure strategies on '{identifier}': {e}"))
                })?,
                None => Vec::new(),
            };

        let next_sibling_id = ctx
            .dependency_metadata()
            .get(dependency_metadata::NEXT_SIBLING_ID)
            .and_then(Value::as_str);
        let advisers = adviser_obtainments_for_failure_strategies(
            node_id,
            &failure_strategies,
            next_sibling_id,
        )?;

        let when = node.get_field(yaml_fields::WHEN);
        let when_condition = when
            .as_ref()
            .and_then(|when| when.node().get_string("condition"));

        let parameters = StepElementParameters {
            identifier: identifier.clone(),
            name: name.clone(),
            step_type: step_type.clone(),
            timeout: node.get_string(yaml_fields::TIMEOUT),
            when: when.map(|when| when.node().to_json()).transpose()?,
            spec: node
                .get_field(yaml_fields::SPEC)
                .map(|spec| spec.node().to_json())
                .transpose()?
                .unwrap_or(Value::Null),
            rollback_parameters: Self::rollback_parameters(ctx, &failure_strategies),
            failure_strategies,
        };
        let step_parameters =
            serde_json::to_value(&parameters).map_err(|e| serialization_error(node_id, e))?;

        let plan_node = PlanNode::builder(node_id, identifier, StepType::step(&step_type))
            .name(name)
            .group(NodeGroup::Step)
            .facilitator_obtainment(FacilitatorObtainment::new(facilitator_for_step_type(
                &step_type,
            )))
            .adviser_obtainments(advisers)
            .when_condition(when_condition)
            .step_parameters(step_parameters)
            .build();
        Ok(PlanCreationResponse::from_node(plan_node))
    }
}
