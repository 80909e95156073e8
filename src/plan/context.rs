use super::response::Dependency;
use crate::yaml::YamlField;
use serde_json::Value;
use std::collections::HashMap;

/// Everything a plan creator sees while expanding one dependency
#[derive(Debug, Clone)]
pub struct PlanCreationContext {
    current_field: YamlField,
    dependency_metadata: HashMap<String, Value>,
    global_context: HashMap<String, Value>,
}

impl PlanCreationContext {
    pub fn new(current_field: YamlField) -> Self {
        Self {
            current_field,
            dependency_metadata: HashMap::new(),
            global_context: HashMap::new(),
        }
    }

    /// Context for expanding `dependency` with a snapshot of the plan-wide context
    pub fn for_dependency(dependency: &Dependency, global_context: HashMap<String, Value>) -> Self {
        Self {
            current_field: dependency.field().clone(),
            dependency_metadata: dependency.metadata().clone(),
            global_context,
        }
    }

    pub fn current_field(&self) -> &YamlField {
        &self.current_field
    }

    pub fn dependency_metadata(&self) -> &HashMap<String, Value> {
        &self.dependency_metadata
    }

    /// Metadata value passed down by the parent creator, falling back to the plan-wide context
    pub fn lookup_str(&self, key: &str) -> Option<&str> {
        self.dependency_metadata
            .get(key)
            .or_else(|| self.global_context.get(key))
            .and_then(Value::as_str)
    }

    pub fn global_context(&self) -> &HashMap<String, Value> {
        &self.global_context
    }
}
