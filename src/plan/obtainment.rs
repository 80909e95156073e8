//! Declarative instructions attached to plan nodes.
//!
//! An obtainment names an adviser / facilitator type and carries an opaque parameter blob.
//! Only the implementation registered for that type knows the blob's schema; the plan just
//! moves bytes around.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdviserType {
    NextStep,
    OnFail,
    Retry,
    Ignore,
    Abort,
    MarkSuccess,
    ManualIntervention,
    RollbackCustom,
    /// Adviser contributed by an embedding application
    Custom(String),
}

impl fmt::Display for AdviserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdviserType::NextStep => f.write_str("NEXT_STEP"),
            AdviserType::OnFail => f.write_str("ON_FAIL"),
            AdviserType::Retry => f.write_str("RETRY"),
            AdviserType::Ignore => f.write_str("IGNORE"),
            AdviserType::Abort => f.write_str("ABORT"),
            AdviserType::MarkSuccess => f.write_str("MARK_SUCCESS"),
            AdviserType::ManualIntervention => f.write_str("MANUAL_INTERVENTION"),
            AdviserType::RollbackCustom => f.write_str("ROLLBACK_CUSTOM"),
            AdviserType::Custom(name) => write!(f, "CUSTOM({name})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FacilitatorType {
    /// Delegate to a single child and wait for it
    Child,
    Children,
    ChildChain,
    Task,
    TaskChain,
    Async,
    Sync,
    Barrier,
}

impl FacilitatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacilitatorType::Child => "CHILD",
            FacilitatorType::Children => "CHILDREN",
            FacilitatorType::ChildChain => "CHILD_CHAIN",
            FacilitatorType::Task => "TASK",
            FacilitatorType::TaskChain => "TASK_CHAIN",
            FacilitatorType::Async => "ASYNC",
            FacilitatorType::Sync => "SYNC",
            FacilitatorType::Barrier => "BARRIER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviserObtainment {
    pub adviser_type: AdviserType,
    pub parameters: Vec<u8>,
}

impl AdviserObtainment {
    pub fn new(adviser_type: AdviserType) -> Self {
        Self {
            adviser_type,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameters<T: Serialize>(
        adviser_type: AdviserType,
        parameters: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            adviser_type,
            parameters: serde_json::to_vec(parameters)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorObtainment {
    pub facilitator_type: FacilitatorType,
    pub parameters: Vec<u8>,
}

impl FacilitatorObtainment {
    pub fn new(facilitator_type: FacilitatorType) -> Self {
        Self {
            facilitator_type,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameters<T: Serialize>(
        facilitator_type: FacilitatorType,
        parameters: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            facilitator_type,
            parameters: serde_json::to_vec(parameters)?,
        })
    }
}

/// Parameters of the CHILD facilitator
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildFacilitatorParameters {
    pub child_node_id: String,
}

/// Parameters of the CHILDREN facilitator; `max_concurrency` 0 means unbounded
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildrenFacilitatorParameters {
    pub child_node_ids: Vec<String>,
    pub max_concurrency: u32,
}

/// Decode an adviser / facilitator parameter blob; an empty blob yields the default
pub fn decode_parameters<T: DeserializeOwned + Default>(
    bytes: &[u8],
) -> Result<T, serde_json::Error> {
    if bytes.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes)
}
