use super::adviser::Adviser;
use super::advisers::{
    AbortAdviser, IgnoreAdviser, ManualInterventionAdviser, MarkSuccessAdviser, NextStepAdviser,
    OnFailAdviser, RetryAdviser, RollbackCustomAdviser,
};
use super::errors::{AdviseError, AdviseResult};
use super::sweeping_output::ExecutionSweepingOutputService;
use crate::plan::obtainment::AdviserType;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Adviser implementations keyed by type. Populated at startup; lookups of unknown types fail
/// immediately.
#[derive(Default)]
pub struct AdviserRegistry {
    advisers: HashMap<AdviserType, Arc<dyn Adviser>>,
}

impl AdviserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in adviser
    pub fn with_defaults(sweeping_output: Arc<dyn ExecutionSweepingOutputService>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(NextStepAdviser));
        registry.register(Arc::new(OnFailAdviser));
        registry.register(Arc::new(RetryAdviser));
        registry.register(Arc::new(IgnoreAdviser));
        registry.register(Arc::new(AbortAdviser));
        registry.register(Arc::new(MarkSuccessAdviser));
        registry.register(Arc::new(ManualInterventionAdviser));
        registry.register(Arc::new(RollbackCustomAdviser::new(sweeping_output)));
        registry
    }

    /// Register an adviser, replacing any previous one of the same type
    pub fn register(&mut self, adviser: Arc<dyn Adviser>) {
        let adviser_type = adviser.adviser_type();
        if self.advisers.contains_key(&adviser_type) {
            warn!(adviser_type = %adviser_type, "Replacing registered adviser");
        } else {
            debug!(adviser_type = %adviser_type, "Registered adviser");
        }
        self.advisers.insert(adviser_type, adviser);
    }

    /// The adviser for `adviser_type`; `node_id` attributes the failure
    pub fn obtain(
        &self,
        adviser_type: &AdviserType,
        node_id: &str,
    ) -> AdviseResult<Arc<dyn Adviser>> {
        self.advisers
            .get(adviser_type)
            .cloned()
            .ok_or_else(|| AdviseError::UnregisteredAdviser {
                adviser_type: adviser_type.to_string(),
                node_id: node_id.to_string(),
            })
    }

    pub fn contains(&self, adviser_type: &AdviserType) -> bool {
        self.advisers.contains_key(adviser_type)
    }

    pub fn len(&self) -> usize {
        self.advisers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advisers.is_empty()
    }
}
