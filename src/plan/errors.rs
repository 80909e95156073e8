use crate::yaml::YamlError;
use thiserror::Error;

/// Failures of a plan-creation pass
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanCreationError {
    #[error("Invalid request: execution {node_id} cannot have empty steps")]
    EmptySteps { node_id: String },

    #[error(
        "Invalid request: cannot merge plan creation responses with different starting node ids: {existing} and {incoming}"
    )]
    StartingNodeConflict { existing: String, incoming: String },

    #[error(
        "Invalid request: no plan creator claims field '{field_name}' of type '{yaml_type}' (node {node_id})"
    )]
    UnclaimedDependency {
        node_id: String,
        field_name: String,
        yaml_type: String,
    },

    #[error("Invalid request: {message} (node {node_id})")]
    InvalidYaml { node_id: String, message: String },

    #[error(
        "Invalid request: dependency resolution did not converge after {rounds} rounds, unresolved: {unresolved:?}"
    )]
    ResolutionLimitExceeded {
        rounds: usize,
        unresolved: Vec<String>,
    },

    #[error("Plan creator '{creator}' failed for node {node_id}: {reason}")]
    CreatorFailed {
        creator: String,
        node_id: String,
        reason: String,
    },

    #[error("Plan creator '{creator}' is already registered for field '{field_name}'")]
    DuplicateCreator { creator: String, field_name: String },

    #[error("Serialization error for node {node_id}: {reason}")]
    Serialization { node_id: String, reason: String },

    #[error(transparent)]
    Yaml(#[from] YamlError),
}

impl PlanCreationError {
    /// Structural problems with the submitted pipeline
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            PlanCreationError::EmptySteps { .. }
                | PlanCreationError::StartingNodeConflict { .. }
                | PlanCreationError::UnclaimedDependency { .. }
                | PlanCreationError::InvalidYaml { .. }
                | PlanCreationError::ResolutionLimitExceeded { .. }
                | PlanCreationError::Yaml(_)
        )
    }

    pub fn node_id(&self) -> Option<&str> {
        match self {
            PlanCreationError::EmptySteps { node_id }
            | PlanCreationError::UnclaimedDependency { node_id, .. }
            | PlanCreationError::InvalidYaml { node_id, .. }
            | PlanCreationError::CreatorFailed { node_id, .. }
            | PlanCreationError::Serialization { node_id, .. } => Some(node_id),
            _ => None,
        }
    }
}

pub type PlanCreationResult<T> = Result<T, PlanCreationError>;
