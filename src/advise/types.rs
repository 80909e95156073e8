use super::parameters::RepairAction;
use crate::constants::Status;
use crate::models::{Ambiance, FailureInfo, FailureType, NodeExecution};
use serde::{Deserialize, Serialize};

/// What an adviser is asked about: one node execution that reached `to_status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisingEvent {
    pub ambiance: Ambiance,
    pub node_execution_id: String,
    pub plan_node_id: String,
    pub failure_info: Option<FailureInfo>,
    pub from_status: Status,
    pub to_status: Status,
    pub retry_ids: Vec<String>,
    /// Parameter blob of the adviser obtainment being consulted
    pub adviser_parameters: Vec<u8>,
}

impl AdvisingEvent {
    pub fn from_node_execution(node_execution: &NodeExecution, to_status: Status) -> Self {
        Self {
            ambiance: node_execution.ambiance.clone(),
            node_execution_id: node_execution.uuid.clone(),
            plan_node_id: node_execution.plan_node_id.clone(),
            failure_info: node_execution.failure_info.clone(),
            from_status: node_execution.status,
            to_status,
            retry_ids: node_execution.retry_ids.clone(),
            adviser_parameters: Vec::new(),
        }
    }

    pub fn with_parameters(&self, parameters: &[u8]) -> Self {
        Self {
            adviser_parameters: parameters.to_vec(),
            ..self.clone()
        }
    }

    /// Whether the failure falls within `applicable`; an empty list or a missing failure
    /// info matches everything
    pub fn failure_matches(&self, applicable: &[FailureType]) -> bool {
        if applicable.is_empty() {
            return true;
        }
        match &self.failure_info {
            Some(info) if !info.is_empty() => {
                let types = info.all_failure_types();
                types.is_empty() || types.iter().any(|t| applicable.contains(t))
            }
            _ => true,
        }
    }
}

/// Decision of an adviser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdviserResponse {
    /// Continue with `next_node_id`, or end this branch when `None`
    NextStep {
        next_node_id: Option<String>,
        to_status: Option<Status>,
    },
    Retry {
        wait_interval_secs: u64,
        retry_index: u32,
    },
    InterventionWait {
        timeout_secs: u64,
        repair_action: RepairAction,
    },
    EndPlan {
        is_abort: bool,
    },
    MarkSuccess {
        next_node_id: Option<String>,
    },
    IgnoreFailure {
        next_node_id: Option<String>,
    },
    /// No adviser produced a decision
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SdkResponseEventType {
    HandleAdviserResponse,
    HandleEventError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SdkResponsePayload {
    AdviserResponse {
        response: AdviserResponse,
        to_status: Status,
    },
    EventError {
        error_message: String,
        failure_types: Vec<FailureType>,
    },
}

/// Event handed to the execution framework once advising is done
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkResponseEvent {
    pub event_type: SdkResponseEventType,
    pub plan_execution_id: String,
    pub node_execution_id: String,
    pub payload: SdkResponsePayload,
}

impl SdkResponseEvent {
    pub fn adviser_response(
        plan_execution_id: impl Into<String>,
        node_execution_id: impl Into<String>,
        response: AdviserResponse,
        to_status: Status,
    ) -> Self {
        Self {
            event_type: SdkResponseEventType::HandleAdviserResponse,
            plan_execution_id: plan_execution_id.into(),
            node_execution_id: node_execution_id.into(),
            payload: SdkResponsePayload::AdviserResponse {
                response,
                to_status,
            },
        }
    }

    pub fn event_error(
        plan_execution_id: impl Into<String>,
        node_execution_id: impl Into<String>,
        error_message: impl Into<String>,
        failure_types: Vec<FailureType>,
    ) -> Self {
        Self {
            event_type: SdkResponseEventType::HandleEventError,
            plan_execution_id: plan_execution_id.into(),
            node_execution_id: node_execution_id.into(),
            payload: SdkResponsePayload::EventError {
                error_message: error_message.into(),
                failure_types,
            },
        }
    }

    pub fn adviser_decision(&self) -> Option<&AdviserResponse> {
        match &self.payload {
            SdkResponsePayload::AdviserResponse { response, .. } => Some(response),
            SdkResponsePayload::EventError { .. } => None,
        }
    }
}
