//! # System Constants
//!
//! Execution statuses, status groupings, YAML field names and the well-known keys used to
//! thread information between plan creators, advisers and the rollback machinery.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a node execution or a plan execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Queued,
    Running,
    AsyncWaiting,
    TaskWaiting,
    TimedWaiting,
    InterventionWaiting,
    ApprovalWaiting,
    ResourceWaiting,
    InputWaiting,
    Paused,
    Discontinuing,
    Succeeded,
    Skipped,
    IgnoreFailed,
    Suspended,
    Failed,
    Errored,
    Expired,
    Aborted,
    ApprovalRejected,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Queued => "QUEUED",
            Status::Running => "RUNNING",
            Status::AsyncWaiting => "ASYNC_WAITING",
            Status::TaskWaiting => "TASK_WAITING",
            Status::TimedWaiting => "TIMED_WAITING",
            Status::InterventionWaiting => "INTERVENTION_WAITING",
            Status::ApprovalWaiting => "APPROVAL_WAITING",
            Status::ResourceWaiting => "RESOURCE_WAITING",
            Status::InputWaiting => "INPUT_WAITING",
            Status::Paused => "PAUSED",
            Status::Discontinuing => "DISCONTINUING",
            Status::Succeeded => "SUCCEEDED",
            Status::Skipped => "SKIPPED",
            Status::IgnoreFailed => "IGNORE_FAILED",
            Status::Suspended => "SUSPENDED",
            Status::Failed => "FAILED",
            Status::Errored => "ERRORED",
            Status::Expired => "EXPIRED",
            Status::Aborted => "ABORTED",
            Status::ApprovalRejected => "APPROVAL_REJECTED",
        }
    }

    pub fn is_final(&self) -> bool {
        status_groups::FINAL_STATUSES.contains(self)
    }

    pub fn is_broke(&self) -> bool {
        status_groups::BROKE_STATUSES.contains(self)
    }

    pub fn is_positive(&self) -> bool {
        status_groups::POSITIVE_STATUSES.contains(self)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status groupings used by advisers and the no-adviser fallback
pub mod status_groups {
    use super::Status;

    /// Statuses after which a node never transitions again
    pub const FINAL_STATUSES: &[Status] = &[
        Status::Succeeded,
        Status::Skipped,
        Status::IgnoreFailed,
        Status::Suspended,
        Status::Failed,
        Status::Errored,
        Status::Expired,
        Status::Aborted,
        Status::ApprovalRejected,
    ];

    /// Final statuses that represent a failure the pipeline may react to
    pub const BROKE_STATUSES: &[Status] = &[
        Status::Failed,
        Status::Errored,
        Status::Expired,
        Status::ApprovalRejected,
    ];

    /// Final statuses after which execution continues with the next node
    pub const POSITIVE_STATUSES: &[Status] = &[
        Status::Succeeded,
        Status::Skipped,
        Status::IgnoreFailed,
        Status::Suspended,
    ];
}

/// Field names in the pipeline YAML
pub mod yaml_fields {
    pub const UUID: &str = "__uuid";
    pub const EXECUTION: &str = "execution";
    pub const SPEC: &str = "spec";
    pub const STEPS: &str = "steps";
    pub const ROLLBACK_STEPS: &str = "rollbackSteps";
    pub const STEP: &str = "step";
    pub const PARALLEL: &str = "parallel";
    pub const STEP_GROUP: &str = "stepGroup";
    pub const IDENTIFIER: &str = "identifier";
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const TIMEOUT: &str = "timeout";
    pub const WHEN: &str = "when";
    pub const FAILURE_STRATEGIES: &str = "failureStrategies";
}

/// Suffixes and identifiers for structural nodes synthesised during plan creation
pub mod plan_ids {
    /// Suffix of the combined rollback section of an execution's steps
    pub const COMBINED_ROLLBACK_ID_SUFFIX: &str = "_combinedRollback";
    /// Suffix of a step group's rollback section
    pub const STEP_GROUP_ROLLBACK_ID_SUFFIX: &str = "_stepGroupRollback";
    /// Step type name of section nodes (execution, steps, rollback sections)
    pub const NG_SECTION: &str = "NG_SECTION";
    pub const NG_SECTION_WITH_ROLLBACK_INFO: &str = "NG_SECTION_WITH_ROLLBACK_INFO";
    pub const NG_FORK: &str = "NG_FORK";
    pub const STEP_GROUP: &str = "STEP_GROUP";
}

/// Keys of per-dependency metadata passed from composite creators to their children
pub mod dependency_metadata {
    pub const NEXT_SIBLING_ID: &str = "nextSiblingId";
    pub const STAGE_ROLLBACK_NODE_ID: &str = "stageRollbackNodeId";
    pub const STEP_GROUP_ROLLBACK_NODE_ID: &str = "stepGroupRollbackNodeId";
}

/// Keys of the plan-wide creation context
pub mod context_keys {
    pub const EXECUTION_NODE_ID: &str = "executionNodeId";
    pub const STEPS_NODE_ID: &str = "stepsNodeId";
    pub const ROLLBACK_PLAN_PRESENT: &str = "rollbackPlanPresent";
}

/// Names of sweeping outputs published by the core
pub mod sweeping_outputs {
    /// Rollback target resolved for the failing step group / stage
    pub const USE_ROLLBACK_STRATEGY: &str = "useRollbackStrategy";
}

/// Keys of interrupt metadata
pub mod interrupt_metadata {
    pub const ROLLBACK: &str = "ROLLBACK";
}
