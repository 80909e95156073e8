//! End-to-end plan creation over the built-in creators

mod common;

use async_trait::async_trait;
use common::builders::*;
use pipeline_core::advise::parameters::NextStepAdviserParameters;
use pipeline_core::config::PlanCreationConfig;
use pipeline_core::constants::{context_keys, plan_ids};
use pipeline_core::models::{RollbackStrategy, StepElementParameters};
use pipeline_core::plan::creators::ExecutionPlanCreator;
use pipeline_core::plan::obtainment::decode_parameters;
use pipeline_core::plan::{
    AdviserType, PartialPlanCreator, Plan, PlanCreationContext, PlanCreationError,
    PlanCreationResponse, PlanCreationResult, PlanCreatorRegistry, PlanCreatorService, PlanNode,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

async fn deploy_plan() -> Plan {
    PlanCreatorService::with_defaults(PlanCreationConfig::default())
        .create_plan(DEPLOY_PIPELINE)
        .await
        .unwrap()
}

fn step_parameters(node: &PlanNode) -> StepElementParameters {
    serde_json::from_value(node.step_parameters().clone()).unwrap()
}

fn adviser_types(node: &PlanNode) -> Vec<AdviserType> {
    node.adviser_obtainments()
        .iter()
        .map(|obtainment| obtainment.adviser_type.clone())
        .collect()
}

fn next_step_target(node: &PlanNode) -> Option<String> {
    node.adviser_obtainments()
        .iter()
        .find(|obtainment| obtainment.adviser_type == AdviserType::NextStep)
        .map(|obtainment| {
            decode_parameters::<NextStepAdviserParameters>(&obtainment.parameters)
                .unwrap()
                .next_node_id
                .unwrap()
        })
}

#[tokio::test]
async fn test_deploy_pipeline_resolves_every_node() {
    let plan = deploy_plan().await;

    let identifiers: HashSet<&str> = plan.nodes.values().map(|n| n.identifier()).collect();
    for expected in [
        "execution",
        "steps",
        "combinedRollback",
        "build",
        "unit_tests",
        "lint",
        "canary",
        "canary_rollback",
        "canary_deploy",
        "canary_delete",
        "rolling_deploy",
        "rolling_rollback",
        "notify",
    ] {
        assert!(identifiers.contains(expected), "missing node {expected}");
    }
    let forks = plan
        .nodes
        .values()
        .filter(|n| n.step_type().type_name == plan_ids::NG_FORK)
        .count();
    assert_eq!(forks, 1);
    assert_eq!(plan.nodes.len(), 14);

    let execution = plan.node(&plan.starting_node_id).unwrap();
    assert_eq!(execution.identifier(), "execution");
}

#[tokio::test]
async fn test_context_records_section_ids() {
    let plan = deploy_plan().await;
    let steps = plan.node_by_identifier("steps").unwrap();

    assert_eq!(
        plan.context[context_keys::EXECUTION_NODE_ID],
        serde_json::json!(plan.starting_node_id)
    );
    assert_eq!(
        plan.context[context_keys::STEPS_NODE_ID],
        serde_json::json!(steps.uuid())
    );
    assert_eq!(
        plan.context[context_keys::ROLLBACK_PLAN_PRESENT],
        serde_json::json!(true)
    );
}

#[tokio::test]
async fn test_top_level_steps_are_chained() {
    let plan = deploy_plan().await;
    let build = plan.node_by_identifier("build").unwrap();
    let canary = plan.node_by_identifier("canary").unwrap();
    let rolling = plan.node_by_identifier("rolling_deploy").unwrap();
    let fork = plan
        .nodes
        .values()
        .find(|n| n.step_type().type_name == plan_ids::NG_FORK)
        .unwrap();

    assert_eq!(next_step_target(build).as_deref(), Some(fork.uuid()));
    assert_eq!(next_step_target(fork).as_deref(), Some(canary.uuid()));
    assert_eq!(next_step_target(canary).as_deref(), Some(rolling.uuid()));
    assert_eq!(next_step_target(rolling), None);

    // Parallel children run side by side and never link to each other
    assert_eq!(next_step_target(plan.node_by_identifier("unit_tests").unwrap()), None);
    assert_eq!(next_step_target(plan.node_by_identifier("lint").unwrap()), None);
}

#[tokio::test]
async fn test_rollback_targets_are_wired_into_step_parameters() {
    let plan = deploy_plan().await;
    let steps = plan.node_by_identifier("steps").unwrap();
    let canary = plan.node_by_identifier("canary").unwrap();
    let combined_id = format!("{}{}", steps.uuid(), plan_ids::COMBINED_ROLLBACK_ID_SUFFIX);
    let group_rollback_id = format!("{}{}", canary.uuid(), plan_ids::STEP_GROUP_ROLLBACK_ID_SUFFIX);

    assert_eq!(adviser_types(steps), vec![AdviserType::RollbackCustom]);
    assert_eq!(steps.step_parameters()["rollbackNodeId"], serde_json::json!(combined_id));
    assert_eq!(plan.node(&combined_id).unwrap().identifier(), "combinedRollback");
    assert_eq!(plan.node(&group_rollback_id).unwrap().identifier(), "canary_rollback");

    let rolling = step_parameters(plan.node_by_identifier("rolling_deploy").unwrap());
    // The retry follow-up declares the rollback before the catch-all strategy does
    assert_eq!(rolling.rollback_parameters.strategy, RollbackStrategy::StageRollback);
    assert_eq!(
        rolling.rollback_parameters.strategy_to_uuid,
        HashMap::from([(RollbackStrategy::StageRollback, combined_id.clone())])
    );

    let canary_deploy = step_parameters(plan.node_by_identifier("canary_deploy").unwrap());
    assert_eq!(
        canary_deploy.rollback_parameters.strategy,
        RollbackStrategy::StepGroupRollback
    );
    assert_eq!(
        canary_deploy.rollback_parameters.strategy_to_uuid,
        HashMap::from([
            (RollbackStrategy::StageRollback, combined_id),
            (RollbackStrategy::StepGroupRollback, group_rollback_id),
        ])
    );
}

#[tokio::test]
async fn test_rollback_steps_never_route_into_rollback() {
    let plan = deploy_plan().await;

    for identifier in ["rolling_rollback", "notify", "canary_delete"] {
        let parameters = step_parameters(plan.node_by_identifier(identifier).unwrap());
        assert!(
            parameters.rollback_parameters.strategy_to_uuid.is_empty(),
            "{identifier} must not know any rollback section"
        );
    }
    // Rollback steps are chained among themselves
    let rollback = plan.node_by_identifier("rolling_rollback").unwrap();
    let notify = plan.node_by_identifier("notify").unwrap();
    assert_eq!(next_step_target(rollback).as_deref(), Some(notify.uuid()));
}

#[tokio::test]
async fn test_failure_strategies_become_advisers_in_order() {
    let plan = deploy_plan().await;

    assert_eq!(
        adviser_types(plan.node_by_identifier("rolling_deploy").unwrap()),
        vec![AdviserType::Retry, AdviserType::OnFail]
    );
    assert_eq!(
        adviser_types(plan.node_by_identifier("canary").unwrap()),
        vec![AdviserType::RollbackCustom, AdviserType::NextStep]
    );
}

#[tokio::test]
async fn test_layout_starts_at_first_step() {
    let plan = deploy_plan().await;
    let build = plan.node_by_identifier("build").unwrap();
    let layout = &plan.graph_layout;

    assert_eq!(layout.starting_node_id(), Some(build.uuid()));
    let build_layout = &layout.layout_nodes()[build.uuid()];
    assert_eq!(build_layout.node_group, "STEP");
    assert_eq!(build_layout.name, "Build");
    assert_eq!(build_layout.edge_layout_list.next_ids.len(), 1);

    let canary = plan.node_by_identifier("canary").unwrap();
    let canary_layout = &layout.layout_nodes()[canary.uuid()];
    assert_eq!(canary_layout.node_group, "STEP_GROUP");
    assert_eq!(canary_layout.edge_layout_list.current_node_children.len(), 1);
}

#[tokio::test]
async fn test_empty_steps_are_rejected() {
    let service = PlanCreatorService::with_defaults(PlanCreationConfig::default());
    let err = service
        .create_plan("execution:\n  steps: []\n")
        .await
        .unwrap_err();

    assert!(matches!(err, PlanCreationError::EmptySteps { .. }));
    assert!(err.is_invalid_request());
    assert!(err.to_string().contains("cannot have empty steps"));
}

#[tokio::test]
async fn test_unparseable_retry_interval_fails_the_plan() {
    let yaml = r#"
execution:
  steps:
    - step:
        identifier: flaky
        type: Http
        failureStrategies:
          - onFailure:
              errors:
                - AllErrors
              action:
                type: Retry
                spec:
                  retryCount: 2
                  retryIntervals:
                    - 10 s
                  onRetryFailure:
                    action:
                      type: Abort
"#;
    let service = PlanCreatorService::with_defaults(PlanCreationConfig::default());
    let err = service.create_plan(yaml).await.unwrap_err();

    assert!(err.is_invalid_request());
    assert!(err.to_string().contains("'10 s'"));
}

#[tokio::test]
async fn test_unclaimed_dependency_names_the_field() {
    let mut registry = PlanCreatorRegistry::new();
    registry
        .register(Arc::new(ExecutionPlanCreator::new()))
        .unwrap();
    let service = PlanCreatorService::new(Arc::new(registry), PlanCreationConfig::default());

    let err = service.create_plan(SINGLE_STEP_PIPELINE).await.unwrap_err();
    match err {
        PlanCreationError::UnclaimedDependency {
            field_name,
            yaml_type,
            ..
        } => {
            assert_eq!(field_name, "step");
            assert_eq!(yaml_type, "ShellScript");
        }
        other => panic!("expected an unclaimed dependency, got {other:?}"),
    }
}

/// Creator that re-emits its own input forever
struct LoopingCreator;

#[async_trait]
impl PartialPlanCreator for LoopingCreator {
    fn name(&self) -> &'static str {
        "looping"
    }

    fn supported_types(&self) -> HashMap<String, HashSet<String>> {
        HashMap::from([("step".to_string(), HashSet::new())])
    }

    async fn handle_node(
        &self,
        ctx: &PlanCreationContext,
    ) -> PlanCreationResult<PlanCreationResponse> {
        let mut response = PlanCreationResponse::new();
        response.add_dependency(dependency(&format!(
            "{}-again",
            ctx.current_field().node().uuid()
        )));
        Ok(response)
    }
}

#[tokio::test]
async fn test_non_converging_creators_hit_the_round_limit() {
    let mut registry = PlanCreatorRegistry::new();
    registry
        .register(Arc::new(ExecutionPlanCreator::new()))
        .unwrap();
    registry.register(Arc::new(LoopingCreator)).unwrap();
    let config = PlanCreationConfig {
        max_resolution_rounds: 5,
        ..PlanCreationConfig::default()
    };
    let service = PlanCreatorService::new(Arc::new(registry), config);

    let err = service.create_plan(SINGLE_STEP_PIPELINE).await.unwrap_err();
    assert!(matches!(
        err,
        PlanCreationError::ResolutionLimitExceeded { rounds: 5, .. }
    ));
}

#[tokio::test]
async fn test_overlapping_creator_registration_is_rejected() {
    let mut registry = PlanCreatorRegistry::with_defaults();
    let err = registry.register(Arc::new(LoopingCreator)).unwrap_err();
    assert!(matches!(err, PlanCreationError::DuplicateCreator { .. }));
}

#[tokio::test]
async fn test_plans_are_identical_regardless_of_concurrency() {
    let sequential = PlanCreatorService::with_defaults(PlanCreationConfig {
        resolver_concurrency: 1,
        ..PlanCreationConfig::default()
    });
    let concurrent = PlanCreatorService::with_defaults(PlanCreationConfig {
        resolver_concurrency: 16,
        ..PlanCreationConfig::default()
    });

    // Ids are injected on parse, so both passes must read the same document
    let root = pipeline_core::yaml::YamlUtils::read_tree(DEPLOY_PIPELINE).unwrap();
    let document = root.node().to_yaml_string().unwrap();

    let first = sequential.create_plan(&document).await.unwrap();
    let second = concurrent.create_plan(&document).await.unwrap();
    assert_eq!(first.nodes, second.nodes);
    assert_eq!(first.starting_node_id, second.starting_node_id);
    assert_eq!(first.graph_layout, second.graph_layout);
}
