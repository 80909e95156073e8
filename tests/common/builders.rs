//! Fixtures and builders shared by the integration tests

#![allow(dead_code)]

use pipeline_core::models::{
    Ambiance, ExecutionMode, FailureInfo, FailureType, InterruptConfig, InterruptEffect,
    InterruptType, Level, NodeExecution, NodeGroup, StepCategory, StepType,
};
use pipeline_core::plan::{Dependency, PlanNode};
use pipeline_core::yaml::{YamlField, YamlNode};
use pipeline_core::Status;
use std::collections::HashMap;

/// A deploy pipeline exercising every built-in creator: a plain step, a parallel block, a step
/// group with its own rollback section, a stage-rollback step and stage rollback steps.
pub const DEPLOY_PIPELINE: &str = r#"
pipeline:
  identifier: deploy
spec:
  execution:
    steps:
      - step:
          identifier: build
          name: Build
          type: ShellScript
          timeout: 10m
      - parallel:
          - step:
              identifier: unit_tests
              type: ShellScript
          - step:
              identifier: lint
              type: ShellScript
      - stepGroup:
          identifier: canary
          name: Canary
          steps:
            - step:
                identifier: canary_deploy
                type: K8sCanaryDeploy
                failureStrategies:
                  - onFailure:
                      errors:
                        - AllErrors
                      action:
                        type: StepGroupRollback
          rollbackSteps:
            - step:
                identifier: canary_delete
                type: ShellScript
      - step:
          identifier: rolling_deploy
          type: K8sRollingDeploy
          failureStrategies:
            - onFailure:
                errors:
                  - Timeout
                action:
                  type: Retry
                  spec:
                    retryCount: 2
                    retryIntervals:
                      - 10s
                      - 1m
                    onRetryFailure:
                      action:
                        type: StageRollback
            - onFailure:
                errors:
                  - AllErrors
                action:
                  type: StageRollback
    rollbackSteps:
      - step:
          identifier: rolling_rollback
          type: K8sRollingRollback
      - step:
          identifier: notify
          type: Email
"#;

/// Smallest runnable pipeline
pub const SINGLE_STEP_PIPELINE: &str = r#"
execution:
  steps:
    - step:
        identifier: echo
        type: ShellScript
"#;

/// A dependency whose YAML node id is `id`
pub fn dependency(id: &str) -> Dependency {
    Dependency::new(YamlField::new(
        "step",
        YamlNode::from_value(serde_yaml::Value::Null, id.to_string()),
    ))
}

/// A bare plan node with id `id`
pub fn plan_node(id: &str) -> PlanNode {
    PlanNode::builder(id, id, StepType::step("ShellScript")).build()
}

/// Level for a plan node executed as `runtime_id`
pub fn level(
    setup_id: &str,
    runtime_id: &str,
    identifier: &str,
    group: Option<NodeGroup>,
) -> Level {
    let category = match group {
        Some(NodeGroup::StepGroup) => StepCategory::StepGroup,
        Some(NodeGroup::Stage) => StepCategory::Stage,
        _ => StepCategory::Step,
    };
    Level::new(
        setup_id,
        runtime_id,
        identifier,
        StepType::new(identifier, category),
        group,
    )
}

/// Builder for node executions in a given plan execution
pub struct NodeExecutionBuilder {
    ambiance: Ambiance,
    identifier: String,
    status: Status,
    mode: ExecutionMode,
    failure_info: Option<FailureInfo>,
    interrupt_metadata: Option<HashMap<String, String>>,
    parent_id: Option<String>,
    previous_id: Option<String>,
    next_id: Option<String>,
    start_ts: Option<i64>,
    end_ts: Option<i64>,
    step_parameters: serde_json::Value,
    old_retry: bool,
}

impl NodeExecutionBuilder {
    /// Execution of plan node `plan_node_id` as `runtime_id`, nested under `parents`
    pub fn new(
        plan_execution_id: &str,
        plan_node_id: &str,
        runtime_id: &str,
        parents: &[Level],
    ) -> Self {
        let mut ambiance = Ambiance::new(plan_execution_id, "plan-1");
        for parent in parents {
            ambiance = ambiance.clone_for_child(parent.clone());
        }
        let ambiance =
            ambiance.clone_for_child(level(plan_node_id, runtime_id, plan_node_id, None));
        Self {
            ambiance,
            identifier: plan_node_id.to_string(),
            status: Status::Running,
            mode: ExecutionMode::Task,
            failure_info: None,
            interrupt_metadata: None,
            parent_id: None,
            previous_id: None,
            next_id: None,
            start_ts: None,
            end_ts: None,
            step_parameters: serde_json::Value::Null,
            old_retry: false,
        }
    }

    pub fn identifier(mut self, identifier: &str) -> Self {
        self.identifier = identifier.to_string();
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn failed_with(mut self, message: &str, failure_types: Vec<FailureType>) -> Self {
        self.status = Status::Failed;
        self.failure_info = Some(FailureInfo::new(message, failure_types));
        self
    }

    pub fn interrupted_with(mut self, metadata: HashMap<String, String>) -> Self {
        self.interrupt_metadata = Some(metadata);
        self
    }

    pub fn parent(mut self, parent_id: &str) -> Self {
        self.parent_id = Some(parent_id.to_string());
        self
    }

    pub fn previous(mut self, previous_id: &str) -> Self {
        self.previous_id = Some(previous_id.to_string());
        self
    }

    pub fn next(mut self, next_id: &str) -> Self {
        self.next_id = Some(next_id.to_string());
        self
    }

    pub fn timestamps(mut self, start_ts: i64, end_ts: Option<i64>) -> Self {
        self.start_ts = Some(start_ts);
        self.end_ts = end_ts;
        self
    }

    pub fn step_parameters(mut self, step_parameters: serde_json::Value) -> Self {
        self.step_parameters = step_parameters;
        self
    }

    pub fn old_retry(mut self) -> Self {
        self.old_retry = true;
        self
    }

    pub fn build(self) -> NodeExecution {
        let mut execution =
            NodeExecution::started(self.ambiance, self.identifier.clone(), self.mode);
        execution.identifier = self.identifier;
        execution.status = self.status;
        execution.failure_info = self.failure_info;
        execution.parent_id = self.parent_id;
        execution.previous_id = self.previous_id;
        execution.next_id = self.next_id;
        if self.start_ts.is_some() {
            execution.start_ts = self.start_ts;
        }
        execution.end_ts = self.end_ts;
        execution.step_parameters = self.step_parameters;
        execution.old_retry = self.old_retry;
        if let Some(metadata) = self.interrupt_metadata {
            execution.interrupt_histories.push(InterruptEffect {
                interrupt_id: format!("{}-interrupt", execution.uuid),
                took_effect_at: execution.last_updated_at,
                interrupt_type: InterruptType::CustomFailure,
                interrupt_config: InterruptConfig {
                    issued_by: "tests".to_string(),
                    issued_at: execution.last_updated_at,
                    metadata,
                },
            });
        }
        execution
    }
}
