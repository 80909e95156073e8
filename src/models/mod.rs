//! # Execution Models
//!
//! Runtime data shared by the plan creators, advisers, event publisher and graph mapper.
//!
//! - [`ambiance`] - execution context stack and its lookups
//! - [`node_execution`] - runtime record of a plan node's execution
//! - [`failure`] - failure info attached to broke executions
//! - [`step_parameters`] - step node parameters, failure strategies, rollback routing
//! - [`step_type`] - step types, node groups, skip types

pub mod ambiance;
pub mod failure;
pub mod node_execution;
pub mod step_parameters;
pub mod step_type;

pub use ambiance::{Ambiance, ExecutionMetadata, Level, StrategyMetadata};
pub use failure::{FailureData, FailureInfo, FailureType};
pub use node_execution::{
    ExecutableResponse, ExecutionMode, InterruptConfig, InterruptEffect, InterruptType,
    NodeExecution, NodeRunInfo, SkipInfo, UnitProgress,
};
pub use step_parameters::{
    parse_duration_secs, FailureStrategyAction, FailureStrategyConfig, FollowUpAction,
    ManualInterventionSpec, NgFailureType, OnFailRollbackParameters, OnFailureConfig,
    RetrySpec, RollbackStrategy, StepElementParameters,
};
pub use step_type::{NodeGroup, SkipType, StepCategory, StepType};
