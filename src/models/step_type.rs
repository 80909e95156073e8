use serde::{Deserialize, Serialize};

/// Broad category of a step type, used to locate stage / step-group levels in an ambiance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepCategory {
    Pipeline,
    Stages,
    Stage,
    StepGroup,
    Step,
    Strategy,
    Fork,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepType {
    #[serde(rename = "type")]
    pub type_name: String,
    pub step_category: StepCategory,
}

impl StepType {
    pub fn new(type_name: impl Into<String>, step_category: StepCategory) -> Self {
        Self {
            type_name: type_name.into(),
            step_category,
        }
    }

    pub fn step(type_name: impl Into<String>) -> Self {
        Self::new(type_name, StepCategory::Step)
    }
}

/// Structural group a plan node belongs to; also the scope name for sweeping outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeGroup {
    Pipeline,
    Stages,
    Stage,
    Execution,
    StepGroup,
    Step,
}

impl NodeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeGroup::Pipeline => "PIPELINE",
            NodeGroup::Stages => "STAGES",
            NodeGroup::Stage => "STAGE",
            NodeGroup::Execution => "EXECUTION",
            NodeGroup::StepGroup => "STEP_GROUP",
            NodeGroup::Step => "STEP",
        }
    }
}

/// How much of the graph is hidden when a node is skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipType {
    #[default]
    Noop,
    SkipNode,
    SkipTree,
}
