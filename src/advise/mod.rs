//! # Node Advising
//!
//! Decides what happens after a node execution reaches a status: continue with the next node,
//! retry, route into a rollback section, wait for a human, or end the plan.
//!
//! Each [`PlanNode`](crate::plan::PlanNode) carries an ordered list of adviser obtainments.
//! [`NodeAdviseHelper`] resolves them through the [`AdviserRegistry`], asks each adviser in
//! turn whether it can advise, and publishes the first decision as an [`SdkResponseEvent`].
//!
//! Rollback routing works through the sweeping-output side channel: a failing step publishes
//! its rollback target with [`RollbackExecutableUtility`], and the `ROLLBACK_CUSTOM` adviser of
//! the enclosing section picks it up.

pub mod adviser;
pub mod advisers;
pub mod errors;
pub mod helper;
pub mod parameters;
pub mod registry;
pub mod rollback;
pub mod sweeping_output;
pub mod types;

pub use adviser::Adviser;
pub use advisers::{
    AbortAdviser, IgnoreAdviser, ManualInterventionAdviser, MarkSuccessAdviser, NextStepAdviser,
    OnFailAdviser, RetryAdviser, RollbackCustomAdviser,
};
pub use errors::{AdviseError, AdviseResult, RollbackError, SweepingOutputError};
pub use helper::{
    AdviseCommand, AdviseQueueHandle, AdviseQueueStats, ChannelSdkResponsePublisher,
    NodeAdviseHelper, SdkResponseEventPublisher,
};
pub use parameters::RepairAction;
pub use registry::AdviserRegistry;
pub use rollback::{RollbackExecutableUtility, RollbackOutput};
pub use sweeping_output::{
    ExecutionSweepingOutputService, InMemorySweepingOutputService, PLAN_SCOPE,
};
pub use types::{
    AdviserResponse, AdvisingEvent, SdkResponseEvent, SdkResponseEventType, SdkResponsePayload,
};
