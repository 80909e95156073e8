use super::obtainment::{AdviserObtainment, FacilitatorObtainment};
use crate::models::{NodeGroup, SkipType, StepType};
use serde::{Deserialize, Serialize};

/// One executable unit of a plan. Built once through [`PlanNodeBuilder`] and read-only after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanNode {
    uuid: String,
    identifier: String,
    name: String,
    step_type: StepType,
    group: Option<NodeGroup>,
    facilitator_obtainments: Vec<FacilitatorObtainment>,
    adviser_obtainments: Vec<AdviserObtainment>,
    skip_graph_type: SkipType,
    skip_expression_chain: bool,
    when_condition: Option<String>,
    step_parameters: serde_json::Value,
}

impl PlanNode {
    pub fn builder(
        uuid: impl Into<String>,
        identifier: impl Into<String>,
        step_type: StepType,
    ) -> PlanNodeBuilder {
        PlanNodeBuilder::new(uuid.into(), identifier.into(), step_type)
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_type(&self) -> &StepType {
        &self.step_type
    }

    pub fn group(&self) -> Option<NodeGroup> {
        self.group
    }

    pub fn facilitator_obtainments(&self) -> &[FacilitatorObtainment] {
        &self.facilitator_obtainments
    }

    pub fn adviser_obtainments(&self) -> &[AdviserObtainment] {
        &self.adviser_obtainments
    }

    pub fn skip_graph_type(&self) -> SkipType {
        self.skip_graph_type
    }

    pub fn skip_expression_chain(&self) -> bool {
        self.skip_expression_chain
    }

    pub fn when_condition(&self) -> Option<&str> {
        self.when_condition.as_deref()
    }

    pub fn step_parameters(&self) -> &serde_json::Value {
        &self.step_parameters
    }
}

pub struct PlanNodeBuilder {
    node: PlanNode,
}

impl PlanNodeBuilder {
    fn new(uuid: String, identifier: String, step_type: StepType) -> Self {
        Self {
            node: PlanNode {
                name: identifier.clone(),
                uuid,
                identifier,
                step_type,
                group: None,
                facilitator_obtainments: Vec::new(),
                adviser_obtainments: Vec::new(),
                skip_graph_type: SkipType::Noop,
                skip_expression_chain: false,
                when_condition: None,
                step_parameters: serde_json::Value::Null,
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.node.name = name.into();
        self
    }

    pub fn group(mut self, group: NodeGroup) -> Self {
        self.node.group = Some(group);
        self
    }

    pub fn facilitator_obtainment(mut self, obtainment: FacilitatorObtainment) -> Self {
        self.node.facilitator_obtainments.push(obtainment);
        self
    }

    pub fn adviser_obtainment(mut self, obtainment: AdviserObtainment) -> Self {
        self.node.adviser_obtainments.push(obtainment);
        self
    }

    pub fn adviser_obtainments(mut self, obtainments: Vec<AdviserObtainment>) -> Self {
        self.node.adviser_obtainments.extend(obtainments);
        self
    }

    pub fn skip_graph_type(mut self, skip_type: SkipType) -> Self {
        self.node.skip_graph_type = skip_type;
        self
    }

    pub fn skip_expression_chain(mut self, skip: bool) -> Self {
        self.node.skip_expression_chain = skip;
        self
    }

    pub fn when_condition(mut self, condition: Option<String>) -> Self {
        self.node.when_condition = condition;
        self
    }

    pub fn step_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.node.step_parameters = parameters;
        self
    }

    pub fn build(self) -> PlanNode {
        self.node
    }
}
