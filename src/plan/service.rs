//! # Plan Creator Service
//!
//! Entry point for turning a pipeline YAML document into an executable [`Plan`].
//!
//! ```rust,no_run
//! use pipeline_core::config::PlanCreationConfig;
//! use pipeline_core::plan::PlanCreatorService;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = PlanCreatorService::with_defaults(PlanCreationConfig::default());
//! let plan = service
//!     .create_plan("execution:\n  steps:\n    - step:\n        identifier: a\n        type: Http\n")
//!     .await?;
//! assert!(plan.node(&plan.starting_node_id).is_some());
//! # Ok(())
//! # }
//! ```

use super::creator::PlanCreatorRegistry;
use super::errors::{PlanCreationError, PlanCreationResult};
use super::layout::GraphLayoutResponse;
use super::node::PlanNode;
use super::resolver::DependencyResolver;
use super::response::{Dependency, PlanCreationResponse};
use crate::config::PlanCreationConfig;
use crate::constants::yaml_fields;
use crate::logging::log_plan_operation;
use crate::yaml::{YamlField, YamlUtils};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// A fully resolved execution plan
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub plan_id: String,
    pub nodes: HashMap<String, PlanNode>,
    pub starting_node_id: String,
    pub graph_layout: GraphLayoutResponse,
    pub context: HashMap<String, Value>,
}

impl Plan {
    pub fn node(&self, id: &str) -> Option<&PlanNode> {
        self.nodes.get(id)
    }

    /// First node with the given identifier
    pub fn node_by_identifier(&self, identifier: &str) -> Option<&PlanNode> {
        self.nodes.values().find(|node| node.identifier() == identifier)
    }
}

pub struct PlanCreatorService {
    resolver: DependencyResolver,
}

impl PlanCreatorService {
    pub fn new(registry: Arc<PlanCreatorRegistry>, config: PlanCreationConfig) -> Self {
        Self {
            resolver: DependencyResolver::new(registry, config),
        }
    }

    /// Service backed by the built-in creators
    pub fn with_defaults(config: PlanCreationConfig) -> Self {
        Self::new(Arc::new(PlanCreatorRegistry::with_defaults()), config)
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    /// Parse `yaml` and resolve its execution section into a plan
    #[instrument(skip_all)]
    pub async fn create_plan(&self, yaml: &str) -> PlanCreationResult<Plan> {
        let root = YamlUtils::read_tree(yaml)?;
        let execution = locate_execution(&root).ok_or_else(|| PlanCreationError::InvalidYaml {
            node_id: root.node().uuid().to_string(),
            message: "document has no execution section".to_string(),
        })?;
        let starting_node_id = execution.node().uuid().to_string();

        let mut seed = PlanCreationResponse::from_dependency(Dependency::new(execution));
        seed.set_starting_node_id(starting_node_id.clone())?;
        let parts = self.resolver.resolve(seed).await?.into_parts();

        let plan = Plan {
            plan_id: Uuid::new_v4().to_string(),
            nodes: parts.nodes,
            starting_node_id: parts.starting_node_id.unwrap_or(starting_node_id),
            graph_layout: parts.graph_layout,
            context: parts.context,
        };
        log_plan_operation(
            "create_plan",
            Some(&plan.plan_id),
            Some(&plan.starting_node_id),
            "created",
            Some(&format!("{} nodes", plan.nodes.len())),
        );
        Ok(plan)
    }
}

/// `execution` at the root, under `spec`, or under `stage.spec`
fn locate_execution(root: &YamlField) -> Option<YamlField> {
    let node = root.node();
    node.get_field(yaml_fields::EXECUTION)
        .or_else(|| {
            node.get_field(yaml_fields::SPEC)?
                .node()
                .get_field(yaml_fields::EXECUTION)
        })
        .or_else(|| {
            node.get_field("stage")?
                .node()
                .get_field(yaml_fields::SPEC)?
                .node()
                .get_field(yaml_fields::EXECUTION)
        })
}
