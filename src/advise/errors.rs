use crate::models::RollbackStrategy;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdviseError {
    #[error("No adviser registered for type {adviser_type} (node {node_id})")]
    UnregisteredAdviser {
        adviser_type: String,
        node_id: String,
    },

    #[error("Adviser {adviser_type} failed for node {node_id}: {reason}")]
    AdviserFailed {
        adviser_type: String,
        node_id: String,
        reason: String,
    },

    #[error("Invalid {adviser_type} adviser parameters on node {node_id}: {reason}")]
    InvalidParameters {
        adviser_type: String,
        node_id: String,
        reason: String,
    },

    #[error("Advise queue is full, dropped event for node execution {node_execution_id}")]
    QueueFull { node_execution_id: String },

    #[error("Advise queue is closed")]
    QueueClosed,

    #[error("Failed to deliver SDK response for node execution {node_execution_id}: {reason}")]
    ResponseDelivery {
        node_execution_id: String,
        reason: String,
    },
}

impl AdviseError {
    /// Plan node the failure is attributable to
    pub fn node_id(&self) -> Option<&str> {
        match self {
            AdviseError::UnregisteredAdviser { node_id, .. }
            | AdviseError::AdviserFailed { node_id, .. }
            | AdviseError::InvalidParameters { node_id, .. } => Some(node_id),
            _ => None,
        }
    }
}

pub type AdviseResult<T> = Result<T, AdviseError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollbackError {
    #[error(
        "Rollback strategy is not propagated for step {step_identifier} (node {node_id}), step parameters: {step_parameters}"
    )]
    StrategyNotPropagated {
        node_id: String,
        step_identifier: String,
        step_parameters: String,
    },

    #[error("No rollback node for strategy {strategy} on step {step_identifier} (node {node_id})")]
    NoTargetForStrategy {
        node_id: String,
        step_identifier: String,
        strategy: RollbackStrategy,
    },

    #[error("Invalid rollback parameters on node {node_id}: {reason}")]
    InvalidParameters { node_id: String, reason: String },

    #[error(transparent)]
    SweepingOutput(#[from] SweepingOutputError),
}

impl RollbackError {
    pub fn node_id(&self) -> Option<&str> {
        match self {
            RollbackError::StrategyNotPropagated { node_id, .. }
            | RollbackError::NoTargetForStrategy { node_id, .. }
            | RollbackError::InvalidParameters { node_id, .. } => Some(node_id),
            RollbackError::SweepingOutput(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SweepingOutputError {
    #[error("Sweeping output '{name}' could not be serialized: {reason}")]
    Serialization { name: String, reason: String },
}
