//! # Sweeping Outputs
//!
//! Side-channel key/value pairs published while a plan executes and read back by later steps
//! and advisers.
//!
//! An output is scoped to one level of the publishing ambiance: the innermost level whose group
//! matches the requested group, or the whole plan execution when no group is requested (or no
//! level carries it). Lookups walk the reader's ambiance from the innermost level outward and
//! finish at plan scope, so a value published at a step-group level is visible to every node
//! inside that step group and to the group node itself.
//!
//! Publishing the same name twice in the same scope overwrites: the last write is
//! authoritative. The in-memory service also observes plan transitions and drops a plan
//! execution's outputs once it reaches a final status.

use super::errors::SweepingOutputError;
use crate::constants::Status;
use crate::events::{EventLogError, OrchestrationObserver};
use crate::models::{Ambiance, NodeGroup};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Scope id used for plan-wide outputs
pub const PLAN_SCOPE: &str = "";

pub trait ExecutionSweepingOutputService: Send + Sync {
    /// Store `value` under `name`; returns the id of the scope it was stored in
    fn consume(
        &self,
        ambiance: &Ambiance,
        name: &str,
        value: Value,
        group: Option<NodeGroup>,
    ) -> Result<String, SweepingOutputError>;

    /// The value visible to `ambiance` under `name`, if any
    fn resolve_optional(&self, ambiance: &Ambiance, name: &str) -> Option<Value>;
}

/// Serialize and store a typed output
pub fn consume_typed<T: Serialize>(
    service: &dyn ExecutionSweepingOutputService,
    ambiance: &Ambiance,
    name: &str,
    value: &T,
    group: Option<NodeGroup>,
) -> Result<String, SweepingOutputError> {
    let value = serde_json::to_value(value).map_err(|e| SweepingOutputError::Serialization {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    service.consume(ambiance, name, value, group)
}

/// Resolve and decode a typed output; undecodable values are treated as absent
pub fn resolve_typed<T: DeserializeOwned>(
    service: &dyn ExecutionSweepingOutputService,
    ambiance: &Ambiance,
    name: &str,
) -> Option<T> {
    service
        .resolve_optional(ambiance, name)
        .and_then(|value| serde_json::from_value(value).ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OutputKey {
    plan_execution_id: String,
    scope: String,
    name: String,
}

/// Process-local sweeping-output store
#[derive(Debug, Default)]
pub struct InMemorySweepingOutputService {
    outputs: DashMap<OutputKey, Value>,
}

impl InMemorySweepingOutputService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Drop every output of a finished plan execution
    pub fn clear_plan_execution(&self, plan_execution_id: &str) {
        self.outputs
            .retain(|key, _| key.plan_execution_id != plan_execution_id);
    }

    fn key(ambiance: &Ambiance, scope: &str, name: &str) -> OutputKey {
        OutputKey {
            plan_execution_id: ambiance.plan_execution_id.clone(),
            scope: scope.to_string(),
            name: name.to_string(),
        }
    }
}

impl OrchestrationObserver for InMemorySweepingOutputService {
    fn name(&self) -> &'static str {
        "InMemorySweepingOutputService"
    }

    fn on_plan_status_update(
        &self,
        ambiance: &Ambiance,
        status: Status,
    ) -> Result<(), EventLogError> {
        if status.is_final() {
            self.clear_plan_execution(&ambiance.plan_execution_id);
        }
        Ok(())
    }
}

impl ExecutionSweepingOutputService for InMemorySweepingOutputService {
    fn consume(
        &self,
        ambiance: &Ambiance,
        name: &str,
        value: Value,
        group: Option<NodeGroup>,
    ) -> Result<String, SweepingOutputError> {
        let scope = group
            .and_then(|group| ambiance.innermost_level_of_group(group))
            .map(|level| level.runtime_id.as_str())
            .unwrap_or(PLAN_SCOPE)
            .to_string();
        debug!(
            plan_execution_id = %ambiance.plan_execution_id,
            scope = %scope,
            name,
            "Consumed sweeping output"
        );
        self.outputs.insert(Self::key(ambiance, &scope, name), value);
        Ok(scope)
    }

    fn resolve_optional(&self, ambiance: &Ambiance, name: &str) -> Option<Value> {
        ambiance
            .levels
            .iter()
            .rev()
            .map(|level| level.runtime_id.as_str())
            .chain(std::iter::once(PLAN_SCOPE))
            .find_map(|scope| {
                self.outputs
                    .get(&Self::key(ambiance, scope, name))
                    .map(|entry| entry.value().clone())
            })
    }
}
