//! Translation of `failureStrategies` into adviser obtainments.

use super::serialization_error;
use crate::advise::parameters::{
    AbortAdviserParameters, IgnoreAdviserParameters, ManualInterventionAdviserParameters,
    MarkSuccessAdviserParameters, NextStepAdviserParameters, OnFailAdviserParameters,
    RepairAction, RetryAdviserParameters,
};
use crate::models::{parse_duration_secs, FailureStrategyAction, FailureStrategyConfig};
use crate::plan::errors::{PlanCreationError, PlanCreationResult};
use crate::plan::obtainment::{AdviserObtainment, AdviserType};

/// Advisers for a node in declaration order of its failure strategies, followed by
/// `NEXT_STEP` when the node has a next sibling
pub fn adviser_obtainments_for_failure_strategies(
    node_id: &str,
    strategies: &[FailureStrategyConfig],
    next_sibling_id: Option<&str>,
) -> PlanCreationResult<Vec<AdviserObtainment>> {
    let next_node_id = next_sibling_id.map(str::to_string);
    let mut obtainments = Vec::with_capacity(strategies.len() + 1);

    for strategy in strategies {
        let applicable_failure_types = strategy.on_failure.failure_types();
        let obtainment = match &strategy.on_failure.action {
            FailureStrategyAction::Retry(spec) => AdviserObtainment::with_parameters(
                AdviserType::Retry,
                &RetryAdviserParameters {
                    applicable_failure_types,
                    retry_count: spec.retry_count,
                    wait_intervals_secs: spec
                        .retry_intervals
                        .iter()
                        .map(|interval| duration_secs(node_id, "retryIntervals", interval))
                        .collect::<PlanCreationResult<_>>()?,
                    repair_action_after_retry: RepairAction::from(
                        spec.on_retry_failure.action.as_ref(),
                    ),
                    next_node_id: next_node_id.clone(),
                },
            ),
            FailureStrategyAction::ManualIntervention(spec) => AdviserObtainment::with_parameters(
                AdviserType::ManualIntervention,
                &ManualInterventionAdviserParameters {
                    applicable_failure_types,
                    timeout_secs: duration_secs(node_id, "timeout", &spec.timeout)?,
                    timeout_action: RepairAction::from(spec.on_timeout.action.as_ref()),
                },
            ),
            FailureStrategyAction::Ignore => AdviserObtainment::with_parameters(
                AdviserType::Ignore,
                &IgnoreAdviserParameters {
                    applicable_failure_types,
                    next_node_id: next_node_id.clone(),
                },
            ),
            FailureStrategyAction::Abort => AdviserObtainment::with_parameters(
                AdviserType::Abort,
                &AbortAdviserParameters {
                    applicable_failure_types,
                },
            ),
            FailureStrategyAction::MarkAsSuccess => AdviserObtainment::with_parameters(
                AdviserType::MarkSuccess,
                &MarkSuccessAdviserParameters {
                    applicable_failure_types,
                    next_node_id: next_node_id.clone(),
                },
            ),
            // Rollbacks and plain failures end this branch; the enclosing section routes on
            FailureStrategyAction::StageRollback
            | FailureStrategyAction::StepGroupRollback
            | FailureStrategyAction::PipelineRollback
            | FailureStrategyAction::MarkAsFailure => AdviserObtainment::with_parameters(
                AdviserType::OnFail,
                &OnFailAdviserParameters {
                    applicable_failure_types,
                    next_node_id: None,
                },
            ),
        }
        .map_err(|e| serialization_error(node_id, e))?;
        obtainments.push(obtainment);
    }

    if let Some(next_node_id) = next_node_id {
        obtainments.push(
            AdviserObtainment::with_parameters(
                AdviserType::NextStep,
                &NextStepAdviserParameters {
                    next_node_id: Some(next_node_id),
                },
            )
            .map_err(|e| serialization_error(node_id, e))?,
        );
    }
    Ok(obtainments)
}

fn duration_secs(node_id: &str, field: &str, value: &str) -> PlanCreationResult<u64> {
    parse_duration_secs(value).ok_or_else(|| PlanCreationError::InvalidYaml {
        node_id: node_id.to_string(),
        message: format!("invalid duration '{value}' in {field}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::obtainment::decode_parameters;

    fn strategies(json: serde_json::Value) -> Vec<FailureStrategyConfig> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_strategies_keep_declaration_order_then_next_step() {
        let strategies = strategies(serde_json::json!([
            {"onFailure": {"errors": ["Timeout"], "action": {"type": "Retry", "spec": {
                "retryCount": 2,
                "retryIntervals": ["10s", "1m"],
                "onRetryFailure": {"action": {"type": "MarkAsSuccess"}}
            }}}},
            {"onFailure": {"errors": ["AllErrors"], "action": {"type": "StageRollback"}}}
        ]));

        let obtainments =
            adviser_obtainments_for_failure_strategies("n", &strategies, Some("next")).unwrap();
        let types: Vec<_> = obtainments.iter().map(|o| o.adviser_type.clone()).collect();
        assert_eq!(
            types,
            vec![AdviserType::Retry, AdviserType::OnFail, AdviserType::NextStep]
        );

        let retry: RetryAdviserParameters =
            decode_parameters(&obtainments[0].parameters).unwrap();
        assert_eq!(retry.retry_count, 2);
        assert_eq!(retry.wait_intervals_secs, vec![10, 60]);
        assert_eq!(retry.repair_action_after_retry, RepairAction::MarkAsSuccess);

        let on_fail: OnFailAdviserParameters =
            decode_parameters(&obtainments[1].parameters).unwrap();
        assert_eq!(on_fail.next_node_id, None);
    }

    #[test]
    fn test_last_sibling_has_no_next_step() {
        let obtainments = adviser_obtainments_for_failure_strategies("n", &[], None).unwrap();
        assert!(obtainments.is_empty());
    }

    #[test]
    fn test_spaced_durations_are_accepted() {
        let strategies = strategies(serde_json::json!([
            {"onFailure": {"errors": ["AllErrors"], "action": {
                "type": "ManualIntervention",
                "spec": {"timeout": "1h 30m", "onTimeout": {"action": {"type": "Abort"}}}
            }}},
            {"onFailure": {"errors": ["Timeout"], "action": {"type": "Retry", "spec": {
                "retryCount": 1,
                "retryIntervals": ["1m 30s"],
                "onRetryFailure": {"action": {"type": "Abort"}}
            }}}}
        ]));

        let obtainments =
            adviser_obtainments_for_failure_strategies("n", &strategies, None).unwrap();
        let intervention: ManualInterventionAdviserParameters =
            decode_parameters(&obtainments[0].parameters).unwrap();
        assert_eq!(intervention.timeout_secs, 5_400);
        let retry: RetryAdviserParameters = decode_parameters(&obtainments[1].parameters).unwrap();
        assert_eq!(retry.wait_intervals_secs, vec![90]);
    }

    #[test]
    fn test_unparseable_durations_are_rejected() {
        let retry = strategies(serde_json::json!([
            {"onFailure": {"errors": ["Timeout"], "action": {"type": "Retry", "spec": {
                "retryCount": 2,
                "retryIntervals": ["10s", "<+input>"],
                "onRetryFailure": {"action": {"type": "Abort"}}
            }}}}
        ]));
        let err =
            adviser_obtainments_for_failure_strategies("retry-node", &retry, None).unwrap_err();
        assert!(err.is_invalid_request());
        assert_eq!(err.node_id(), Some("retry-node"));
        assert!(err.to_string().contains("<+input>"));

        let intervention = strategies(serde_json::json!([
            {"onFailure": {"errors": ["AllErrors"], "action": {
                "type": "ManualIntervention",
                "spec": {"timeout": "soon", "onTimeout": {"action": {"type": "Abort"}}}
            }}}
        ]));
        let err =
            adviser_obtainments_for_failure_strategies("mi-node", &intervention, None).unwrap_err();
        assert!(matches!(
            err,
            PlanCreationError::InvalidYaml { ref node_id, ref message }
                if node_id == "mi-node" && message.contains("'soon'")
        ));
    }
}
