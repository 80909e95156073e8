//! Execution context threaded through a running pipeline.
//!
//! An [`Ambiance`] is the stack of [`Level`]s from the plan root down to the node currently
//! executing, plus the setup abstractions (account / org / project) of the execution.

use super::step_type::{NodeGroup, StepCategory, StepType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod setup_abstraction_keys {
    pub const ACCOUNT_ID: &str = "accountId";
    pub const ORG_IDENTIFIER: &str = "orgIdentifier";
    pub const PROJECT_IDENTIFIER: &str = "projectIdentifier";
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetadata {
    pub run_sequence: i32,
    pub pipeline_identifier: String,
    pub trigger_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyMetadata {
    pub current_iteration: i32,
    pub total_iterations: i32,
}

/// One frame of the execution stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    /// Plan node id
    pub setup_id: String,
    /// Node execution id
    pub runtime_id: String,
    pub identifier: String,
    pub retry_index: i32,
    pub step_type: StepType,
    pub group: Option<NodeGroup>,
    pub node_type: String,
    pub start_ts: i64,
    pub skip_expression_chain: bool,
    pub original_identifier: Option<String>,
    pub strategy_metadata: Option<StrategyMetadata>,
}

impl Level {
    pub fn new(
        setup_id: impl Into<String>,
        runtime_id: impl Into<String>,
        identifier: impl Into<String>,
        step_type: StepType,
        group: Option<NodeGroup>,
    ) -> Self {
        Self {
            setup_id: setup_id.into(),
            runtime_id: runtime_id.into(),
            identifier: identifier.into(),
            retry_index: 0,
            step_type,
            group,
            node_type: "PLAN_NODE".to_string(),
            start_ts: chrono::Utc::now().timestamp_millis(),
            skip_expression_chain: false,
            original_identifier: None,
            strategy_metadata: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ambiance {
    pub plan_execution_id: String,
    pub plan_id: String,
    pub stage_execution_id: Option<String>,
    pub setup_abstractions: HashMap<String, String>,
    pub levels: Vec<Level>,
    pub expression_functor_token: i64,
    pub start_ts: i64,
    pub metadata: ExecutionMetadata,
}

impl Ambiance {
    pub fn new(plan_execution_id: impl Into<String>, plan_id: impl Into<String>) -> Self {
        Self {
            plan_execution_id: plan_execution_id.into(),
            plan_id: plan_id.into(),
            stage_execution_id: None,
            setup_abstractions: HashMap::new(),
            levels: Vec::new(),
            expression_functor_token: 0,
            start_ts: chrono::Utc::now().timestamp_millis(),
            metadata: ExecutionMetadata::default(),
        }
    }

    /// Copy of this ambiance one level deeper
    pub fn clone_for_child(&self, level: Level) -> Self {
        let mut child = self.clone();
        child.levels.push(level);
        child
    }

    pub fn current_level(&self) -> Option<&Level> {
        self.levels.last()
    }

    pub fn current_runtime_id(&self) -> Option<&str> {
        self.current_level().map(|l| l.runtime_id.as_str())
    }

    pub fn current_setup_id(&self) -> Option<&str> {
        self.current_level().map(|l| l.setup_id.as_str())
    }

    pub fn step_identifier(&self) -> Option<&str> {
        self.current_level().map(|l| l.identifier.as_str())
    }

    pub fn current_step_type(&self) -> Option<&StepType> {
        self.current_level().map(|l| &l.step_type)
    }

    pub fn current_group(&self) -> Option<NodeGroup> {
        self.current_level().and_then(|l| l.group)
    }

    pub fn parent_runtime_id(&self) -> Option<&str> {
        let len = self.levels.len();
        if len < 2 {
            return None;
        }
        Some(self.levels[len - 2].runtime_id.as_str())
    }

    pub fn is_retry(&self) -> bool {
        self.current_level().is_some_and(|l| l.retry_index > 0)
    }

    pub fn stage_level(&self) -> Option<&Level> {
        self.innermost_level_of_category(StepCategory::Stage)
    }

    pub fn step_group_level(&self) -> Option<&Level> {
        self.innermost_level_of_category(StepCategory::StepGroup)
    }

    /// Innermost level belonging to `group`
    pub fn innermost_level_of_group(&self, group: NodeGroup) -> Option<&Level> {
        self.levels.iter().rev().find(|l| l.group == Some(group))
    }

    fn innermost_level_of_category(&self, category: StepCategory) -> Option<&Level> {
        self.levels
            .iter()
            .rev()
            .find(|l| l.step_type.step_category == category)
    }

    pub fn account_id(&self) -> Option<&str> {
        self.setup_abstraction(setup_abstraction_keys::ACCOUNT_ID)
    }

    pub fn org_identifier(&self) -> Option<&str> {
        self.setup_abstraction(setup_abstraction_keys::ORG_IDENTIFIER)
    }

    pub fn project_identifier(&self) -> Option<&str> {
        self.setup_abstraction(setup_abstraction_keys::PROJECT_IDENTIFIER)
    }

    fn setup_abstraction(&self, key: &str) -> Option<&str> {
        self.setup_abstractions.get(key).map(String::as_str)
    }
}
