//! Parameter blobs of the built-in advisers.
//!
//! Plan creators serialize these into [`AdviserObtainment`](crate::plan::AdviserObtainment)
//! parameters; the matching adviser decodes them with
//! [`decode_parameters`](crate::plan::obtainment::decode_parameters).

use crate::models::{FailureStrategyAction, FailureType};
use serde::{Deserialize, Serialize};

/// What an adviser falls back to once its own remedy is used up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairAction {
    #[default]
    MarkAsFailure,
    MarkAsSuccess,
    Ignore,
    Abort,
    ManualIntervention,
    Rollback,
}

impl From<&FailureStrategyAction> for RepairAction {
    fn from(action: &FailureStrategyAction) -> Self {
        match action {
            FailureStrategyAction::MarkAsSuccess => RepairAction::MarkAsSuccess,
            FailureStrategyAction::Ignore => RepairAction::Ignore,
            FailureStrategyAction::Abort => RepairAction::Abort,
            FailureStrategyAction::ManualIntervention(_) => RepairAction::ManualIntervention,
            FailureStrategyAction::StageRollback
            | FailureStrategyAction::StepGroupRollback
            | FailureStrategyAction::PipelineRollback => RepairAction::Rollback,
            FailureStrategyAction::Retry(_) | FailureStrategyAction::MarkAsFailure => {
                RepairAction::MarkAsFailure
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextStepAdviserParameters {
    pub next_node_id: Option<String>,
}

/// Also used for rollback actions, where `next_node_id` is `None` and the failure bubbles up
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnFailAdviserParameters {
    pub applicable_failure_types: Vec<FailureType>,
    pub next_node_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryAdviserParameters {
    pub applicable_failure_types: Vec<FailureType>,
    pub retry_count: u32,
    /// Wait before each attempt; the last interval repeats when there are fewer than attempts
    pub wait_intervals_secs: Vec<u64>,
    pub repair_action_after_retry: RepairAction,
    pub next_node_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoreAdviserParameters {
    pub applicable_failure_types: Vec<FailureType>,
    pub next_node_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortAdviserParameters {
    pub applicable_failure_types: Vec<FailureType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkSuccessAdviserParameters {
    pub applicable_failure_types: Vec<FailureType>,
    pub next_node_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualInterventionAdviserParameters {
    pub applicable_failure_types: Vec<FailureType>,
    pub timeout_secs: u64,
    pub timeout_action: RepairAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackCustomAdviserParameters {}
