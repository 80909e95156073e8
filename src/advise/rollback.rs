//! # Rollback Propagation
//!
//! When an executable step fails with a rollback action, the node implementing the chosen
//! rollback strategy is published as the `useRollbackStrategy` sweeping output, scoped to the
//! current step group (plan-wide outside step groups). The `ROLLBACK_CUSTOM` adviser on the
//! enclosing section later reads it to route the failure into the rollback section.
//!
//! ## Strategy precedence
//!
//! 1. The step's own `OnFailRollbackParameters.strategy`, unless it is `UNKNOWN`
//! 2. The `ROLLBACK` key of the failure interrupt's metadata
//! 3. Otherwise [`RollbackError::StrategyNotPropagated`], carrying the step parameters

use super::errors::RollbackError;
use super::sweeping_output::{consume_typed, ExecutionSweepingOutputService};
use crate::constants::{interrupt_metadata, sweeping_outputs};
use crate::models::{
    Ambiance, ExecutionMode, NodeExecution, NodeGroup, RollbackStrategy, StepElementParameters,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Value of the `useRollbackStrategy` sweeping output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackOutput {
    pub strategy: RollbackStrategy,
    pub next_node_id: String,
}

pub struct RollbackExecutableUtility {
    sweeping_output: Arc<dyn ExecutionSweepingOutputService>,
}

impl RollbackExecutableUtility {
    pub fn new(sweeping_output: Arc<dyn ExecutionSweepingOutputService>) -> Self {
        Self { sweeping_output }
    }

    /// Publish the rollback target for a failed step. Returns `None` for execution modes that
    /// do not run step logic. Publishing again overwrites the previous value.
    pub fn publish_rollback_info(
        &self,
        ambiance: &Ambiance,
        mode: ExecutionMode,
        step_parameters: &StepElementParameters,
        metadata: &HashMap<String, String>,
    ) -> Result<Option<RollbackOutput>, RollbackError> {
        if !matches!(
            mode,
            ExecutionMode::Async
                | ExecutionMode::AsyncChain
                | ExecutionMode::Task
                | ExecutionMode::TaskChain
        ) {
            return Ok(None);
        }

        let node_id = ambiance.current_setup_id().unwrap_or_default().to_string();
        let strategy = Self::resolve_strategy(step_parameters, metadata).ok_or_else(|| {
            RollbackError::StrategyNotPropagated {
                node_id: node_id.clone(),
                step_identifier: step_parameters.identifier.clone(),
                step_parameters: serde_json::to_string(step_parameters).unwrap_or_default(),
            }
        })?;

        let next_node_id = step_parameters
            .rollback_parameters
            .strategy_to_uuid
            .get(&strategy)
            .cloned()
            .ok_or_else(|| RollbackError::NoTargetForStrategy {
                node_id: node_id.clone(),
                step_identifier: step_parameters.identifier.clone(),
                strategy,
            })?;

        let output = RollbackOutput {
            strategy,
            next_node_id,
        };
        let scope = consume_typed(
            self.sweeping_output.as_ref(),
            ambiance,
            sweeping_outputs::USE_ROLLBACK_STRATEGY,
            &output,
            Some(NodeGroup::StepGroup),
        )?;
        info!(
            plan_execution_id = %ambiance.plan_execution_id,
            step = %step_parameters.identifier,
            strategy = %strategy,
            next_node_id = %output.next_node_id,
            scope = %scope,
            "Published rollback strategy"
        );
        Ok(Some(output))
    }

    /// Same as [`publish_rollback_info`](Self::publish_rollback_info) for a failed node
    /// execution, reading the metadata of its latest interrupt
    pub fn publish_for_node_execution(
        &self,
        node_execution: &NodeExecution,
    ) -> Result<Option<RollbackOutput>, RollbackError> {
        let step_parameters: StepElementParameters =
            serde_json::from_value(node_execution.step_parameters.clone()).map_err(|e| {
                RollbackError::InvalidParameters {
                    node_id: node_execution.plan_node_id.clone(),
                    reason: e.to_string(),
                }
            })?;
        let metadata = node_execution
            .interrupt_histories
            .last()
            .map(|effect| effect.interrupt_config.metadata.clone())
            .unwrap_or_default();
        self.publish_rollback_info(
            &node_execution.ambiance,
            node_execution.mode,
            &step_parameters,
            &metadata,
        )
    }

    fn resolve_strategy(
        step_parameters: &StepElementParameters,
        metadata: &HashMap<String, String>,
    ) -> Option<RollbackStrategy> {
        let declared = step_parameters.rollback_parameters.strategy;
        if declared != RollbackStrategy::Unknown {
            return Some(declared);
        }
        let raw = metadata.get(interrupt_metadata::ROLLBACK)?;
        match raw.parse::<RollbackStrategy>() {
            Ok(RollbackStrategy::Unknown) => None,
            Ok(strategy) => Some(strategy),
            Err(e) => {
                warn!(error = %e, "Ignoring unparseable rollback metadata");
                None
            }
        }
    }
}
