use super::strategies::adviser_obtainments_for_failure_strategies;
use super::{element_fields, inherited_metadata, serialization_error};
use crate::constants::{dependency_metadata, plan_ids, yaml_fields};
use crate::models::{SkipType, StepCategory, StepType};
use crate::plan::context::PlanCreationContext;
use crate::plan::creator::PartialPlanCreator;
use crate::plan::errors::{PlanCreationError, PlanCreationResult};
use crate::plan::node::PlanNode;
use crate::plan::obtainment::{
    ChildrenFacilitatorParameters, FacilitatorObtainment, FacilitatorType,
};
use crate::plan::response::{Dependency, PlanCreationResponse};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

/// Creator for `parallel` blocks: a fork node running every child at once
#[derive(Debug, Default, Clone)]
pub struct ParallelPlanCreator;

impl ParallelPlanCreator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PartialPlanCreator for ParallelPlanCreator {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn supported_types(&self) -> HashMap<String, HashSet<String>> {
        HashMap::from([(yaml_fields::PARALLEL.to_string(), HashSet::new())])
    }

    async fn handle_node(
        &self,
        ctx: &PlanCreationContext,
    ) -> PlanCreationResult<PlanCreationResponse> {
        let node = ctx.current_field().node();
        let node_id = node.uuid();
        let children = element_fields(node)?;
        if children.is_empty() {
            return Err(PlanCreationError::InvalidYaml {
                node_id: node_id.to_string(),
                message: "parallel block has no children".to_string(),
            });
        }

        let child_node_ids: Vec<String> = children
            .iter()
            .map(|child| child.node().uuid().to_string())
            .collect();
        let facilitator = FacilitatorObtainment::with_parameters(
            FacilitatorType::Children,
            &ChildrenFacilitatorParameters {
                child_node_ids: child_node_ids.clone(),
                max_concurrency: 0,
            },
        )
        .map_err(|e| serialization_error(node_id, e))?;

        let next_sibling_id = ctx
            .dependency_metadata()
            .get(dependency_metadata::NEXT_SIBLING_ID)
            .and_then(Value::as_str);
        let advisers = adviser_obtainments_for_failure_strategies(node_id, &[], next_sibling_id)?;

        let fork = PlanNode::builder(
            node_id,
            format!("parallel{node_id}"),
            StepType::new(plan_ids::NG_FORK, StepCategory::Fork),
        )
        .name("parallel")
        .facilitator_obtainment(facilitator)
        .adviser_obtainments(advisers)
        .skip_graph_type(SkipType::SkipNode)
        .step_parameters(json!({ "parallelNodeIds": child_node_ids }))
        .build();

        // Children run side by side, so none of them gets a sibling link
        let inherited = inherited_metadata(ctx.dependency_metadata());
        let mut response = PlanCreationResponse::from_node(fork);
        for child in children {
            response.add_dependency(Dependency::with_metadata(child, inherited.clone()));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::obtainment::{decode_parameters, AdviserType};
    use crate::yaml::YamlUtils;

    const PARALLEL: &str = r#"
- parallel:
    - step:
        identifier: a
        type: ShellScript
    - stepGroup:
        identifier: g
        steps:
          - step:
              identifier: b
              type: Http
"#;

    #[tokio::test]
    async fn test_fork_over_children_without_sibling_links() {
        let root = YamlUtils::read_tree(PARALLEL).unwrap();
        let field = root.node().as_array()[0].first_field().unwrap();
        let ctx = PlanCreationContext::for_dependency(
            &Dependency::with_metadata(
                field.clone(),
                HashMap::from([(
                    dependency_metadata::NEXT_SIBLING_ID.to_string(),
                    json!("after-parallel"),
                )]),
            ),
            HashMap::new(),
        );

        let response = ParallelPlanCreator::new().handle_node(&ctx).await.unwrap();
        let fork = response.node(field.node().uuid()).unwrap();

        let params: ChildrenFacilitatorParameters =
            decode_parameters(&fork.facilitator_obtainments()[0].parameters).unwrap();
        assert_eq!(params.child_node_ids.len(), 2);
        assert_eq!(
            fork.adviser_obtainments()[0].adviser_type,
            AdviserType::NextStep
        );
        assert_eq!(response.dependencies().len(), 2);
        assert!(response
            .dependencies()
            .values()
            .all(|d| d.metadata_str(dependency_metadata::NEXT_SIBLING_ID).is_none()));
    }

    #[tokio::test]
    async fn test_empty_parallel_is_rejected() {
        let root = YamlUtils::read_tree("parallel: []\n").unwrap();
        let field = root.node().get_field("parallel").unwrap();
        let err = ParallelPlanCreator::new()
            .handle_node(&PlanCreationContext::new(field))
            .await
            .unwrap_err();
        assert!(matches!(err, PlanCreationError::InvalidYaml { .. }));
    }
}
