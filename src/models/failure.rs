use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureType {
    ApplicationFailure,
    AuthenticationFailure,
    AuthorizationFailure,
    ConnectivityFailure,
    TimeoutFailure,
    VerificationFailure,
    DelegateProvisioningFailure,
    PolicyEvaluationFailure,
    InputTimeoutFailure,
    ApprovalRejection,
    UnknownFailure,
}

impl FailureType {
    pub const ALL: &'static [FailureType] = &[
        FailureType::ApplicationFailure,
        FailureType::AuthenticationFailure,
        FailureType::AuthorizationFailure,
        FailureType::ConnectivityFailure,
        FailureType::TimeoutFailure,
        FailureType::VerificationFailure,
        FailureType::DelegateProvisioningFailure,
        FailureType::PolicyEvaluationFailure,
        FailureType::InputTimeoutFailure,
        FailureType::ApprovalRejection,
        FailureType::UnknownFailure,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureData {
    pub code: String,
    pub level: String,
    pub message: String,
    pub failure_types: Vec<FailureType>,
}

/// Why a node ended in a broke status
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureInfo {
    pub error_message: String,
    pub failure_types: Vec<FailureType>,
    pub failure_data: Vec<FailureData>,
}

impl FailureInfo {
    pub fn new(error_message: impl Into<String>, failure_types: Vec<FailureType>) -> Self {
        Self {
            error_message: error_message.into(),
            failure_types,
            failure_data: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.error_message.is_empty()
            && self.failure_types.is_empty()
            && self.failure_data.is_empty()
    }

    /// Failure types from the top level and from every failure data entry
    pub fn all_failure_types(&self) -> Vec<FailureType> {
        let mut types = self.failure_types.clone();
        for data in &self.failure_data {
            for failure_type in &data.failure_types {
                if !types.contains(failure_type) {
                    types.push(*failure_type);
                }
            }
        }
        types
    }
}
