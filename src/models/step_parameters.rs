//! Parameters stored on step plan nodes: the step's own YAML plus its parsed failure
//! strategies and rollback routing.

use super::failure::FailureType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Which rollback section a failing step hands control to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RollbackStrategy {
    StageRollback,
    StepGroupRollback,
    PipelineRollback,
    #[default]
    Unknown,
}

impl RollbackStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RollbackStrategy::StageRollback => "STAGE_ROLLBACK",
            RollbackStrategy::StepGroupRollback => "STEP_GROUP_ROLLBACK",
            RollbackStrategy::PipelineRollback => "PIPELINE_ROLLBACK",
            RollbackStrategy::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RollbackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RollbackStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STAGE_ROLLBACK" | "StageRollback" => Ok(RollbackStrategy::StageRollback),
            "STEP_GROUP_ROLLBACK" | "StepGroupRollback" => Ok(RollbackStrategy::StepGroupRollback),
            "PIPELINE_ROLLBACK" | "PipelineRollback" => Ok(RollbackStrategy::PipelineRollback),
            "UNKNOWN" => Ok(RollbackStrategy::Unknown),
            other => Err(format!("Unknown rollback strategy '{other}'")),
        }
    }
}

/// Rollback strategy declared by a step and the node implementing each strategy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnFailRollbackParameters {
    pub strategy: RollbackStrategy,
    pub strategy_to_uuid: HashMap<RollbackStrategy, String>,
}

/// Error categories as written in `failureStrategies[].onFailure.errors`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NgFailureType {
    AllErrors,
    Authentication,
    Authorization,
    Connectivity,
    Timeout,
    Verification,
    DelegateProvisioning,
    PolicyEvaluationFailure,
    InputTimeoutError,
    ApprovalRejection,
    Unknown,
}

impl NgFailureType {
    pub fn failure_types(&self) -> Vec<FailureType> {
        match self {
            NgFailureType::AllErrors => FailureType::ALL.to_vec(),
            NgFailureType::Authentication => vec![FailureType::AuthenticationFailure],
            NgFailureType::Authorization => vec![FailureType::AuthorizationFailure],
            NgFailureType::Connectivity => vec![FailureType::ConnectivityFailure],
            NgFailureType::Timeout => vec![FailureType::TimeoutFailure],
            NgFailureType::Verification => vec![FailureType::VerificationFailure],
            NgFailureType::DelegateProvisioning => vec![FailureType::DelegateProvisioningFailure],
            NgFailureType::PolicyEvaluationFailure => vec![FailureType::PolicyEvaluationFailure],
            NgFailureType::InputTimeoutError => vec![FailureType::InputTimeoutFailure],
            NgFailureType::ApprovalRejection => vec![FailureType::ApprovalRejection],
            NgFailureType::Unknown => {
                vec![FailureType::UnknownFailure, FailureType::ApplicationFailure]
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrySpec {
    pub retry_count: u32,
    #[serde(default)]
    pub retry_intervals: Vec<String>,
    pub on_retry_failure: FollowUpAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualInterventionSpec {
    pub timeout: String,
    pub on_timeout: FollowUpAction,
}

/// The action taken once retries are exhausted or an intervention times out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpAction {
    pub action: Box<FailureStrategyAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "spec")]
pub enum FailureStrategyAction {
    Retry(RetrySpec),
    ManualIntervention(ManualInterventionSpec),
    StageRollback,
    StepGroupRollback,
    PipelineRollback,
    Ignore,
    Abort,
    MarkAsSuccess,
    MarkAsFailure,
}

impl FailureStrategyAction {
    /// The rollback strategy this action selects, if it is a rollback
    pub fn rollback_strategy(&self) -> Option<RollbackStrategy> {
        match self {
            FailureStrategyAction::StageRollback => Some(RollbackStrategy::StageRollback),
            FailureStrategyAction::StepGroupRollback => Some(RollbackStrategy::StepGroupRollback),
            FailureStrategyAction::PipelineRollback => Some(RollbackStrategy::PipelineRollback),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnFailureConfig {
    pub errors: Vec<NgFailureType>,
    pub action: FailureStrategyAction,
}

impl OnFailureConfig {
    pub fn failure_types(&self) -> Vec<FailureType> {
        let mut types = Vec::new();
        for error in &self.errors {
            for failure_type in error.failure_types() {
                if !types.contains(&failure_type) {
                    types.push(failure_type);
                }
            }
        }
        types
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureStrategyConfig {
    pub on_failure: OnFailureConfig,
}

/// Parameters of a step plan node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepElementParameters {
    pub identifier: String,
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: String,
    pub timeout: Option<String>,
    pub when: Option<serde_json::Value>,
    pub spec: serde_json::Value,
    pub failure_strategies: Vec<FailureStrategyConfig>,
    pub rollback_parameters: OnFailRollbackParameters,
}

/// Parse `10s`, `5m`, `1h30m`, `1h 30m`, `2d` into seconds
pub fn parse_duration_secs(input: &str) -> Option<u64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Some(secs);
    }

    let mut total = 0u64;
    let mut digits = String::new();
    for c in input.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        // Whitespace may separate units, never a number from its unit
        if c.is_whitespace() {
            if !digits.is_empty() {
                return None;
            }
            continue;
        }
        let amount: u64 = digits.parse().ok()?;
        digits.clear();
        let multiplier = match c {
            's' => 1,
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            'w' => 604_800,
            _ => return None,
        };
        total = total.checked_add(amount.checked_mul(multiplier)?)?;
    }
    if !digits.is_empty() {
        return None;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_secs() {
        assert_eq!(parse_duration_secs("10s"), Some(10));
        assert_eq!(parse_duration_secs("1m30s"), Some(90));
        assert_eq!(parse_duration_secs("2h"), Some(7_200));
        assert_eq!(parse_duration_secs("45"), Some(45));
        assert_eq!(parse_duration_secs("10x"), None);
        assert_eq!(parse_duration_secs("5m3"), None);
        assert_eq!(parse_duration_secs(""), None);
        assert_eq!(parse_duration_secs("1h 30m"), Some(5_400));
        assert_eq!(parse_duration_secs(" 1m  30s "), Some(90));
        assert_eq!(parse_duration_secs("10 s"), None);
        assert_eq!(parse_duration_secs("<+input>"), None);
    }

    #[test]
    fn test_failure_strategy_deserializes_nested_actions() {
        let json = serde_json::json!([
            {
                "onFailure": {
                    "errors": ["Timeout", "Connectivity"],
                    "action": {
                        "type": "Retry",
                        "spec": {
                            "retryCount": 2,
                            "retryIntervals": ["1s", "5s"],
                            "onRetryFailure": { "action": { "type": "StageRollback" } }
                        }
                    }
                }
            },
            { "onFailure": { "errors": ["AllErrors"], "action": { "type": "Abort" } } }
        ]);

        let strategies: Vec<FailureStrategyConfig> = serde_json::from_value(json).unwrap();

        assert_eq!(strategies.len(), 2);
        match &strategies[0].on_failure.action {
            FailureStrategyAction::Retry(spec) => {
                assert_eq!(spec.retry_count, 2);
                assert_eq!(
                    spec.on_retry_failure.action.rollback_strategy(),
                    Some(RollbackStrategy::StageRollback)
                );
            }
            other => panic!("expected retry, got {other:?}"),
        }
        assert_eq!(
            strategies[1].on_failure.failure_types().len(),
            FailureType::ALL.len()
        );
    }

    #[test]
    fn test_rollback_strategy_round_trips_through_strings() {
        for strategy in [
            RollbackStrategy::StageRollback,
            RollbackStrategy::StepGroupRollback,
            RollbackStrategy::PipelineRollback,
            RollbackStrategy::Unknown,
        ] {
            assert_eq!(strategy.as_str().parse::<RollbackStrategy>(), Ok(strategy));
        }
        assert!("SOMETHING_ELSE".parse::<RollbackStrategy>().is_err());
    }
}
