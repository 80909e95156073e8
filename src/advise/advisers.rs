//! # Built-in Advisers
//!
//! | Type | Advises when | Decision |
//! |---|---|---|
//! | `NEXT_STEP` | status is not broke | continue with the next sibling |
//! | `ON_FAIL` | broke, failure type applies | continue with `next_node_id` or end the branch |
//! | `RETRY` | broke, failure type applies | retry until the count is used, then the repair action |
//! | `IGNORE` | broke, failure type applies | ignore the failure and continue |
//! | `ABORT` | broke, failure type applies | end the plan as aborted |
//! | `MARK_SUCCESS` | broke, failure type applies | mark succeeded and continue |
//! | `MANUAL_INTERVENTION` | broke, failure type applies | wait for a human |
//! | `ROLLBACK_CUSTOM` | broke, a rollback target was published | continue with the rollback node |

use super::adviser::{parameters_of, Adviser};
use super::errors::{AdviseError, AdviseResult};
use super::parameters::{
    AbortAdviserParameters, IgnoreAdviserParameters, ManualInterventionAdviserParameters,
    MarkSuccessAdviserParameters, NextStepAdviserParameters, OnFailAdviserParameters,
    RepairAction, RetryAdviserParameters,
};
use super::rollback::RollbackOutput;
use super::sweeping_output::{resolve_typed, ExecutionSweepingOutputService};
use super::types::{AdviserResponse, AdvisingEvent};
use crate::constants::{sweeping_outputs, Status};
use crate::plan::obtainment::AdviserType;
use std::sync::Arc;

/// Decision for a repair action once the primary remedy is exhausted
pub fn repair_response(
    action: RepairAction,
    next_node_id: Option<String>,
    to_status: Status,
) -> AdviserResponse {
    match action {
        RepairAction::MarkAsSuccess => AdviserResponse::MarkSuccess { next_node_id },
        RepairAction::Ignore => AdviserResponse::IgnoreFailure { next_node_id },
        RepairAction::Abort => AdviserResponse::EndPlan { is_abort: true },
        RepairAction::ManualIntervention => AdviserResponse::InterventionWait {
            timeout_secs: 0,
            repair_action: RepairAction::MarkAsFailure,
        },
        RepairAction::Rollback | RepairAction::MarkAsFailure => AdviserResponse::NextStep {
            next_node_id: None,
            to_status: Some(to_status),
        },
    }
}

#[derive(Debug, Default)]
pub struct NextStepAdviser;

impl Adviser for NextStepAdviser {
    fn adviser_type(&self) -> AdviserType {
        AdviserType::NextStep
    }

    fn can_advise(&self, event: &AdvisingEvent) -> AdviseResult<bool> {
        Ok(!event.to_status.is_broke())
    }

    fn on_advise(&self, event: &AdvisingEvent) -> AdviseResult<AdviserResponse> {
        let params: NextStepAdviserParameters = parameters_of(&self.adviser_type(), event)?;
        Ok(AdviserResponse::NextStep {
            next_node_id: params.next_node_id,
            to_status: None,
        })
    }
}

#[derive(Debug, Default)]
pub struct OnFailAdviser;

impl Adviser for OnFailAdviser {
    fn adviser_type(&self) -> AdviserType {
        AdviserType::OnFail
    }

    fn can_advise(&self, event: &AdvisingEvent) -> AdviseResult<bool> {
        let params: OnFailAdviserParameters = parameters_of(&self.adviser_type(), event)?;
        Ok(event.to_status.is_broke() && event.failure_matches(&params.applicable_failure_types))
    }

    fn on_advise(&self, event: &AdvisingEvent) -> AdviseResult<AdviserResponse> {
        let params: OnFailAdviserParameters = parameters_of(&self.adviser_type(), event)?;
        Ok(AdviserResponse::NextStep {
            next_node_id: params.next_node_id,
            to_status: Some(event.to_status),
        })
    }
}

#[derive(Debug, Default)]
pub struct RetryAdviser;

impl Adviser for RetryAdviser {
    fn adviser_type(&self) -> AdviserType {
        AdviserType::Retry
    }

    fn can_advise(&self, event: &AdvisingEvent) -> AdviseResult<bool> {
        let params: RetryAdviserParameters = parameters_of(&self.adviser_type(), event)?;
        Ok(event.to_status.is_broke() && event.failure_matches(&params.applicable_failure_types))
    }

    fn on_advise(&self, event: &AdvisingEvent) -> AdviseResult<AdviserResponse> {
        let params: RetryAdviserParameters = parameters_of(&self.adviser_type(), event)?;
        let attempts = event.retry_ids.len();
        if attempts < params.retry_count as usize {
            let wait_interval_secs = params
                .wait_intervals_secs
                .get(attempts)
                .or(params.wait_intervals_secs.last())
                .copied()
                .unwrap_or_default();
            return Ok(AdviserResponse::Retry {
                wait_interval_secs,
                retry_index: attempts as u32 + 1,
            });
        }
        Ok(repair_response(
            params.repair_action_after_retry,
            params.next_node_id,
            event.to_status,
        ))
    }
}

#[derive(Debug, Default)]
pub struct IgnoreAdviser;

impl Adviser for IgnoreAdviser {
    fn adviser_type(&self) -> AdviserType {
        AdviserType::Ignore
    }

    fn can_advise(&self, event: &AdvisingEvent) -> AdviseResult<bool> {
        let params: IgnoreAdviserParameters = parameters_of(&self.adviser_type(), event)?;
        Ok(event.to_status.is_broke() && event.failure_matches(&params.applicable_failure_types))
    }

    fn on_advise(&self, event: &AdvisingEvent) -> AdviseResult<AdviserResponse> {
        let params: IgnoreAdviserParameters = parameters_of(&self.adviser_type(), event)?;
        Ok(AdviserResponse::IgnoreFailure {
            next_node_id: params.next_node_id,
        })
    }
}

#[derive(Debug, Default)]
pub struct AbortAdviser;

impl Adviser for AbortAdviser {
    fn adviser_type(&self) -> AdviserType {
        AdviserType::Abort
    }

    fn can_advise(&self, event: &AdvisingEvent) -> AdviseResult<bool> {
        let params: AbortAdviserParameters = parameters_of(&self.adviser_type(), event)?;
        Ok(event.to_status.is_broke() && event.failure_matches(&params.applicable_failure_types))
    }

    fn on_advise(&self, _event: &AdvisingEvent) -> AdviseResult<AdviserResponse> {
        Ok(AdviserResponse::EndPlan { is_abort: true })
    }
}

#[derive(Debug, Default)]
pub struct MarkSuccessAdviser;

impl Adviser for MarkSuccessAdviser {
    fn adviser_type(&self) -> AdviserType {
        AdviserType::MarkSuccess
    }

    fn can_advise(&self, event: &AdvisingEvent) -> AdviseResult<bool> {
        let params: MarkSuccessAdviserParameters = parameters_of(&self.adviser_type(), event)?;
        Ok(event.to_status.is_broke() && event.failure_matches(&params.applicable_failure_types))
    }

    fn on_advise(&self, event: &AdvisingEvent) -> AdviseResult<AdviserResponse> {
        let params: MarkSuccessAdviserParameters = parameters_of(&self.adviser_type(), event)?;
        Ok(AdviserResponse::MarkSuccess {
            next_node_id: params.next_node_id,
        })
    }
}

#[derive(Debug, Default)]
pub struct ManualInterventionAdviser;

impl Adviser for ManualInterventionAdviser {
    fn adviser_type(&self) -> AdviserType {
        AdviserType::ManualIntervention
    }

    fn can_advise(&self, event: &AdvisingEvent) -> AdviseResult<bool> {
        let params: ManualInterventionAdviserParameters =
            parameters_of(&self.adviser_type(), event)?;
        Ok(event.to_status.is_broke() && event.failure_matches(&params.applicable_failure_types))
    }

    fn on_advise(&self, event: &AdvisingEvent) -> AdviseResult<AdviserResponse> {
        let params: ManualInterventionAdviserParameters =
            parameters_of(&self.adviser_type(), event)?;
        Ok(AdviserResponse::InterventionWait {
            timeout_secs: params.timeout_secs,
            repair_action: params.timeout_action,
        })
    }
}

/// Routes a broke section to the rollback node published by
/// [`RollbackExecutableUtility`](super::rollback::RollbackExecutableUtility)
pub struct RollbackCustomAdviser {
    sweeping_output: Arc<dyn ExecutionSweepingOutputService>,
}

impl RollbackCustomAdviser {
    pub fn new(sweeping_output: Arc<dyn ExecutionSweepingOutputService>) -> Self {
        Self { sweeping_output }
    }

    fn published_target(&self, event: &AdvisingEvent) -> Option<RollbackOutput> {
        resolve_typed(
            self.sweeping_output.as_ref(),
            &event.ambiance,
            sweeping_outputs::USE_ROLLBACK_STRATEGY,
        )
    }
}

impl Adviser for RollbackCustomAdviser {
    fn adviser_type(&self) -> AdviserType {
        AdviserType::RollbackCustom
    }

    fn can_advise(&self, event: &AdvisingEvent) -> AdviseResult<bool> {
        Ok(event.to_status.is_broke() && self.published_target(event).is_some())
    }

    fn on_advise(&self, event: &AdvisingEvent) -> AdviseResult<AdviserResponse> {
        let output = self
            .published_target(event)
            .ok_or_else(|| AdviseError::AdviserFailed {
                adviser_type: self.adviser_type().to_string(),
                node_id: event.plan_node_id.clone(),
                reason: "no rollback strategy was published".to_string(),
            })?;
        Ok(AdviserResponse::NextStep {
            next_node_id: Some(output.next_node_id),
            to_status: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advise::sweeping_output::{consume_typed, InMemorySweepingOutputService};
    use crate::models::{Ambiance, FailureInfo, FailureType, RollbackStrategy};

    fn event(to_status: Status, failure_types: Vec<FailureType>) -> AdvisingEvent {
        AdvisingEvent {
            ambiance: Ambiance::new("exec-1", "plan-1"),
            node_execution_id: "ne-1".to_string(),
            plan_node_id: "node-1".to_string(),
            failure_info: Some(FailureInfo::new("boom", failure_types)),
            from_status: Status::Running,
            to_status,
            retry_ids: Vec::new(),
            adviser_parameters: Vec::new(),
        }
    }

    fn with<T: serde::Serialize>(event: &AdvisingEvent, params: &T) -> AdvisingEvent {
        event.with_parameters(&serde_json::to_vec(params).unwrap())
    }

    #[test]
    fn test_next_step_only_advises_non_broke_statuses() {
        let adviser = NextStepAdviser;
        let params = NextStepAdviserParameters {
            next_node_id: Some("b".to_string()),
        };
        assert!(adviser
            .can_advise(&with(&event(Status::Succeeded, vec![]), &params))
            .unwrap());
        assert!(!adviser
            .can_advise(&with(&event(Status::Failed, vec![]), &params))
            .unwrap());
        assert_eq!(
            adviser
                .on_advise(&with(&event(Status::Succeeded, vec![]), &params))
                .unwrap(),
            AdviserResponse::NextStep {
                next_node_id: Some("b".to_string()),
                to_status: None
            }
        );
    }

    #[test]
    fn test_failure_type_filter() {
        let adviser = IgnoreAdviser;
        let params = IgnoreAdviserParameters {
            applicable_failure_types: vec![FailureType::TimeoutFailure],
            next_node_id: None,
        };
        let timeout = with(&event(Status::Failed, vec![FailureType::TimeoutFailure]), &params);
        let auth = with(
            &event(Status::Failed, vec![FailureType::AuthenticationFailure]),
            &params,
        );
        assert!(adviser.can_advise(&timeout).unwrap());
        assert!(!adviser.can_advise(&auth).unwrap());
    }

    #[test]
    fn test_retry_then_repair_action() {
        let adviser = RetryAdviser;
        let params = RetryAdviserParameters {
            applicable_failure_types: Vec::new(),
            retry_count: 2,
            wait_intervals_secs: vec![5],
            repair_action_after_retry: RepairAction::Abort,
            next_node_id: None,
        };
        let mut failed = with(&event(Status::Failed, vec![]), &params);

        assert_eq!(
            adviser.on_advise(&failed).unwrap(),
            AdviserResponse::Retry {
                wait_interval_secs: 5,
                retry_index: 1
            }
        );
        failed.retry_ids = vec!["r1".to_string()];
        assert_eq!(
            adviser.on_advise(&failed).unwrap(),
            AdviserResponse::Retry {
                wait_interval_secs: 5,
                retry_index: 2
            }
        );
        failed.retry_ids.push("r2".to_string());
        assert_eq!(
            adviser.on_advise(&failed).unwrap(),
            AdviserResponse::EndPlan { is_abort: true }
        );
    }

    #[test]
    fn test_invalid_parameters_are_reported_with_node() {
        let failed = event(Status::Failed, vec![]).with_parameters(b"not json");
        let err = OnFailAdviser.can_advise(&failed).unwrap_err();
        assert_eq!(err.node_id(), Some("node-1"));
    }

    #[test]
    fn test_rollback_custom_routes_to_published_target() {
        let service = Arc::new(InMemorySweepingOutputService::new());
        let adviser = RollbackCustomAdviser::new(service.clone());
        let failed = event(Status::Failed, vec![]);
        assert!(!adviser.can_advise(&failed).unwrap());

        consume_typed(
            service.as_ref(),
            &failed.ambiance,
            sweeping_outputs::USE_ROLLBACK_STRATEGY,
            &RollbackOutput {
                strategy: RollbackStrategy::StageRollback,
                next_node_id: "rollback".to_string(),
            },
            None,
        )
        .unwrap();

        assert!(adviser.can_advise(&failed).unwrap());
        assert_eq!(
            adviser.on_advise(&failed).unwrap(),
            AdviserResponse::NextStep {
                next_node_id: Some("rollback".to_string()),
                to_status: None
            }
        );
    }
}
