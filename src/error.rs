//! # Error Taxonomy
//!
//! Each concern owns a `thiserror` enum next to its code; this module re-exports them and
//! folds them into [`OrchestrationError`] for callers that drive the whole core.
//!
//! | Family | Type | Handling |
//! |---|---|---|
//! | Structural plan errors | [`PlanCreationError`] | fatal to the plan-creation pass |
//! | Adviser resolution | [`AdviseError`] | surfaced as a `HANDLE_EVENT_ERROR` response |
//! | Rollback strategy resolution | [`RollbackError`] | fatal, carries the step parameters |
//! | Event publishing / batching | [`PublishError`], [`CacheError`], [`EventLogError`] | logged, never propagated to the transition |

use thiserror::Error;

pub use crate::advise::errors::{AdviseError, RollbackError, SweepingOutputError};
pub use crate::config::ConfigurationError;
pub use crate::events::errors::{CacheError, EventLogError, PublishError};
pub use crate::plan::errors::PlanCreationError;
pub use crate::yaml::YamlError;

/// Crate-wide error for callers driving plan creation, advising and publishing together.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    PlanCreation(#[from] PlanCreationError),

    #[error(transparent)]
    Advise(#[from] AdviseError),

    #[error(transparent)]
    Rollback(#[from] RollbackError),

    #[error(transparent)]
    SweepingOutput(#[from] SweepingOutputError),

    #[error(transparent)]
    EventLog(#[from] EventLogError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Yaml(#[from] YamlError),
}

impl OrchestrationError {
    /// The plan node or node execution this error is attributable to, when known
    pub fn node_id(&self) -> Option<&str> {
        match self {
            OrchestrationError::PlanCreation(err) => err.node_id(),
            OrchestrationError::Advise(err) => err.node_id(),
            OrchestrationError::Rollback(err) => err.node_id(),
            _ => None,
        }
    }

    /// Structural problems with the submitted pipeline, as opposed to runtime failures
    pub fn is_invalid_request(&self) -> bool {
        match self {
            OrchestrationError::PlanCreation(err) => err.is_invalid_request(),
            OrchestrationError::Yaml(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_errors_are_invalid_requests() {
        let err: OrchestrationError = PlanCreationError::EmptySteps {
            node_id: "exec-1".to_string(),
        }
        .into();

        assert!(err.is_invalid_request());
        assert_eq!(err.node_id(), Some("exec-1"));
    }

    #[test]
    fn test_publish_errors_are_not_invalid_requests() {
        let err: OrchestrationError = PublishError::ChannelClosed.into();
        assert!(!err.is_invalid_request());
        assert_eq!(err.node_id(), None);
    }
}
