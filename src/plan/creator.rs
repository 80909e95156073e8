//! # Plan Creators
//!
//! A plan creator claims YAML fields by name (and optionally by `type`) and turns one
//! dependency into a [`PlanCreationResponse`], possibly with deeper dependencies.
//!
//! The [`PlanCreatorRegistry`] is populated at startup; lookup either finds exactly the
//! creator registered for a `(field name, type)` pair or reports nothing, which the resolver
//! turns into an unclaimed-dependency error.

use super::context::PlanCreationContext;
use super::errors::{PlanCreationError, PlanCreationResult};
use super::response::PlanCreationResponse;
use crate::yaml::YamlField;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

#[async_trait]
pub trait PartialPlanCreator: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &'static str;

    /// Field name -> accepted `type` values. An empty set accepts any type.
    fn supported_types(&self) -> HashMap<String, HashSet<String>>;

    /// Expand the context's current field
    async fn handle_node(&self, ctx: &PlanCreationContext)
        -> PlanCreationResult<PlanCreationResponse>;
}

struct Registration {
    types: HashSet<String>,
    creator: Arc<dyn PartialPlanCreator>,
}

#[derive(Default)]
pub struct PlanCreatorRegistry {
    by_field: HashMap<String, Vec<Registration>>,
}

impl PlanCreatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in execution, step, parallel and step-group creators
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for creator in super::creators::default_creators() {
            if let Err(e) = registry.register(creator) {
                warn!(error = %e, "Skipping built-in plan creator");
            }
        }
        registry
    }

    /// Register a creator for every field it supports. Two creators may share a field only
    /// when their type sets are disjoint and non-empty.
    pub fn register(&mut self, creator: Arc<dyn PartialPlanCreator>) -> PlanCreationResult<()> {
        let supported = creator.supported_types();
        for (field_name, types) in &supported {
            if let Some(existing) = self.by_field.get(field_name) {
                let overlaps = existing.iter().any(|registration| {
                    registration.types.is_empty()
                        || types.is_empty()
                        || !registration.types.is_disjoint(types)
                });
                if overlaps {
                    return Err(PlanCreationError::DuplicateCreator {
                        creator: creator.name().to_string(),
                        field_name: field_name.clone(),
                    });
                }
            }
        }

        for (field_name, types) in supported {
            debug!(
                creator = creator.name(),
                field = %field_name,
                types = ?types,
                "Registered plan creator"
            );
            self.by_field
                .entry(field_name)
                .or_default()
                .push(Registration {
                    types,
                    creator: Arc::clone(&creator),
                });
        }
        Ok(())
    }

    /// The creator claiming `field`, if any
    pub fn find(&self, field: &YamlField) -> Option<Arc<dyn PartialPlanCreator>> {
        let registrations = self.by_field.get(field.name())?;
        let yaml_type = field.node().node_type();
        registrations
            .iter()
            .find(|registration| {
                registration.types.is_empty()
                    || yaml_type
                        .as_ref()
                        .is_some_and(|t| registration.types.contains(t))
            })
            .map(|registration| Arc::clone(&registration.creator))
    }

    pub fn supported_fields(&self) -> Vec<&str> {
        self.by_field.keys().map(String::as_str).collect()
    }

    /// Number of field registrations
    pub fn len(&self) -> usize {
        self.by_field.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::YamlUtils;

    struct TypedCreator {
        name: &'static str,
        types: &'static [&'static str],
    }

    #[async_trait]
    impl PartialPlanCreator for TypedCreator {
        fn name(&self) -> &'static str {
            self.name
        }

        fn supported_types(&self) -> HashMap<String, HashSet<String>> {
            HashMap::from([(
                "step".to_string(),
                self.types.iter().map(|t| t.to_string()).collect(),
            )])
        }

        async fn handle_node(
            &self,
            _ctx: &PlanCreationContext,
        ) -> PlanCreationResult<PlanCreationResponse> {
            Ok(PlanCreationResponse::new())
        }
    }

    fn step_field(step_type: &str) -> YamlField {
        let yaml = format!("step:\n  identifier: s\n  type: {step_type}\n");
        YamlUtils::read_tree(&yaml)
            .unwrap()
            .node()
            .get_field("step")
            .unwrap()
    }

    #[test]
    fn test_find_by_field_and_type() {
        let mut registry = PlanCreatorRegistry::new();
        registry
            .register(Arc::new(TypedCreator {
                name: "http",
                types: &["Http"],
            }))
            .unwrap();
        registry
            .register(Arc::new(TypedCreator {
                name: "shell",
                types: &["ShellScript"],
            }))
            .unwrap();

        assert_eq!(registry.find(&step_field("Http")).unwrap().name(), "http");
        assert_eq!(
            registry.find(&step_field("ShellScript")).unwrap().name(),
            "shell"
        );
        assert!(registry.find(&step_field("Terraform")).is_none());
    }

    #[test]
    fn test_overlapping_registration_is_rejected() {
        let mut registry = PlanCreatorRegistry::new();
        registry
            .register(Arc::new(TypedCreator {
                name: "any",
                types: &[],
            }))
            .unwrap();

        let err = registry
            .register(Arc::new(TypedCreator {
                name: "http",
                types: &["Http"],
            }))
            .unwrap_err();
        assert!(matches!(err, PlanCreationError::DuplicateCreator { .. }));
    }
}
