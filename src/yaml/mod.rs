//! # YAML Document Model
//!
//! A read-only view over a pipeline YAML document in which every node has a stable id.
//!
//! Mappings carry their id inline under `__uuid` (injected on first read, preserved across
//! serialization). Arrays and scalars have no place to store one, so their id is derived from
//! the parent: `<parent uuid><field name>` for a field value and `<parent uuid>_<index>` for an
//! array element. Derivation is deterministic, so re-reading a document yields the same ids.
//!
//! ```rust
//! use pipeline_core::yaml::YamlUtils;
//!
//! let root = YamlUtils::read_tree("execution:\n  steps: []\n").unwrap();
//! let execution = root.node().get_field("execution").unwrap();
//! assert_eq!(execution.name(), "execution");
//! assert!(!execution.node().uuid().is_empty());
//! ```

use crate::constants::yaml_fields;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;
use uuid::Uuid;

/// Name given to the field wrapping a whole document
pub const ROOT_FIELD_NAME: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YamlError {
    #[error("Invalid YAML: {0}")]
    Parse(String),

    #[error("YAML serialization error: {0}")]
    Serialization(String),

    #[error("Invalid field blob for '{name}': {reason}")]
    InvalidBlob { name: String, reason: String },
}

/// Parsing entry points
pub struct YamlUtils;

impl YamlUtils {
    /// Parse a document, inject ids into every mapping and wrap it in a root field
    pub fn read_tree(yaml: &str) -> Result<YamlField, YamlError> {
        let mut value: Value =
            serde_yaml::from_str(yaml).map_err(|e| YamlError::Parse(e.to_string()))?;
        Self::inject_uuids(&mut value);
        let fallback = Uuid::new_v4().to_string();
        Ok(YamlField::new(
            ROOT_FIELD_NAME,
            YamlNode::from_value(value, fallback),
        ))
    }

    /// Insert a fresh `__uuid` into every mapping that has none
    pub fn inject_uuids(value: &mut Value) {
        match value {
            Value::Mapping(mapping) => {
                let key = Value::String(yaml_fields::UUID.to_string());
                if !mapping.contains_key(&key) {
                    mapping.insert(key, Value::String(Uuid::new_v4().to_string()));
                }
                for (_, child) in mapping.iter_mut() {
                    Self::inject_uuids(child);
                }
            }
            Value::Sequence(items) => {
                for item in items.iter_mut() {
                    Self::inject_uuids(item);
                }
            }
            Value::Tagged(tagged) => Self::inject_uuids(&mut tagged.value),
            _ => {}
        }
    }
}

/// A node of the document: a subtree plus its id
#[derive(Debug, Clone, PartialEq)]
pub struct YamlNode {
    uuid: String,
    value: Value,
}

impl YamlNode {
    /// Wrap a value, taking its inline id when present and `fallback_uuid` otherwise
    pub fn from_value(value: Value, fallback_uuid: String) -> Self {
        let uuid = value
            .get(yaml_fields::UUID)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(fallback_uuid);
        Self { uuid, value }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_object(&self) -> bool {
        self.value.is_mapping()
    }

    pub fn is_array(&self) -> bool {
        self.value.is_sequence()
    }

    /// Child field by name
    pub fn get_field(&self, name: &str) -> Option<YamlField> {
        let child = self.value.get(name)?;
        Some(YamlField::new(
            name,
            YamlNode::from_value(child.clone(), format!("{}{}", self.uuid, name)),
        ))
    }

    /// Scalar child rendered as a string
    pub fn get_string(&self, name: &str) -> Option<String> {
        match self.value.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn identifier(&self) -> Option<String> {
        self.get_string(yaml_fields::IDENTIFIER)
    }

    pub fn name(&self) -> Option<String> {
        self.get_string(yaml_fields::NAME)
    }

    /// The `type` of the node (step type, stage type, ...)
    pub fn node_type(&self) -> Option<String> {
        self.get_string(yaml_fields::TYPE)
    }

    /// Elements of an array node; empty for anything else
    pub fn as_array(&self) -> Vec<YamlNode> {
        match &self.value {
            Value::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    YamlNode::from_value(item.clone(), format!("{}_{}", self.uuid, index))
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Field names of a mapping, excluding the injected id
    pub fn field_names(&self) -> Vec<String> {
        match &self.value {
            Value::Mapping(mapping) => mapping
                .keys()
                .filter_map(Value::as_str)
                .filter(|key| *key != yaml_fields::UUID)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The single field of a wrapper mapping such as `- step: {...}`
    pub fn first_field(&self) -> Option<YamlField> {
        let name = self.field_names().into_iter().next()?;
        self.get_field(&name)
    }

    /// The subtree without injected ids, as JSON; fails on keys JSON cannot hold
    pub fn to_json(&self) -> Result<serde_json::Value, YamlError> {
        let mut stripped = self.value.clone();
        strip_uuids(&mut stripped);
        serde_json::to_value(&stripped).map_err(|e| YamlError::Serialization(e.to_string()))
    }

    pub fn to_yaml_string(&self) -> Result<String, YamlError> {
        serde_yaml::to_string(&self.value).map_err(|e| YamlError::Serialization(e.to_string()))
    }
}

fn strip_uuids(value: &mut Value) {
    match value {
        Value::Mapping(mapping) => {
            mapping.remove(yaml_fields::UUID);
            for (_, child) in mapping.iter_mut() {
                strip_uuids(child);
            }
        }
        Value::Sequence(items) => items.iter_mut().for_each(strip_uuids),
        _ => {}
    }
}

/// A named node
#[derive(Debug, Clone, PartialEq)]
pub struct YamlField {
    name: String,
    node: YamlNode,
}

impl YamlField {
    pub fn new(name: impl Into<String>, node: YamlNode) -> Self {
        Self {
            name: name.into(),
            node,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> &YamlNode {
        &self.node
    }

    pub fn into_node(self) -> YamlNode {
        self.node
    }

    /// Serialized form for handing a dependency to another process
    pub fn to_blob(&self) -> Result<YamlFieldBlob, YamlError> {
        Ok(YamlFieldBlob {
            name: self.name.clone(),
            uuid: self.node.uuid.clone(),
            yaml: self.node.to_yaml_string()?,
        })
    }

    pub fn from_blob(blob: &YamlFieldBlob) -> Result<Self, YamlError> {
        let value: Value =
            serde_yaml::from_str(&blob.yaml).map_err(|e| YamlError::InvalidBlob {
                name: blob.name.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self::new(
            blob.name.clone(),
            YamlNode::from_value(value, blob.uuid.clone()),
        ))
    }
}

/// Cross-process representation of a [`YamlField`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YamlFieldBlob {
    pub name: String,
    pub uuid: String,
    pub yaml: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXECUTION_YAML: &str = r#"
execution:
  steps:
    - step:
        identifier: build
        type: ShellScript
    - step:
        identifier: deploy
        type: K8sRollingDeploy
"#;

    #[test]
    fn test_read_tree_injects_ids_into_every_mapping() {
        let root = YamlUtils::read_tree(EXECUTION_YAML).unwrap();
        let execution = root.node().get_field("execution").unwrap();
        let steps = execution.node().get_field("steps").unwrap();
        let elements = steps.node().as_array();

        assert_eq!(elements.len(), 2);
        let build = elements[0].first_field().unwrap();
        assert_eq!(build.name(), "step");
        assert_eq!(build.node().identifier().as_deref(), Some("build"));
        assert_ne!(build.node().uuid(), elements[1].first_field().unwrap().node().uuid());
    }

    #[test]
    fn test_array_ids_are_derived_from_parent() {
        let root = YamlUtils::read_tree(EXECUTION_YAML).unwrap();
        let execution = root.node().get_field("execution").unwrap();
        let steps = execution.node().get_field("steps").unwrap();

        assert_eq!(
            steps.node().uuid(),
            format!("{}steps", execution.node().uuid())
        );
        // Asking twice yields the same derived id
        let again = execution.node().get_field("steps").unwrap();
        assert_eq!(steps.node().uuid(), again.node().uuid());
    }

    #[test]
    fn test_blob_preserves_ids() {
        let root = YamlUtils::read_tree(EXECUTION_YAML).unwrap();
        let execution = root.node().get_field("execution").unwrap();
        let steps = execution.node().get_field("steps").unwrap();

        let blob = steps.to_blob().unwrap();
        let restored = YamlField::from_blob(&blob).unwrap();

        assert_eq!(restored.name(), "steps");
        assert_eq!(restored.node().uuid(), steps.node().uuid());
        let original_step = steps.node().as_array()[0].first_field().unwrap();
        let restored_step = restored.node().as_array()[0].first_field().unwrap();
        assert_eq!(original_step.node().uuid(), restored_step.node().uuid());
    }

    #[test]
    fn test_to_json_strips_ids() {
        let root = YamlUtils::read_tree("spec:\n  command: echo hi\n").unwrap();
        let spec = root.node().get_field("spec").unwrap();
        assert_eq!(
            spec.node().to_json().unwrap(),
            serde_json::json!({"command": "echo hi"})
        );
    }

    #[test]
    fn test_to_json_rejects_non_string_keys() {
        let root = YamlUtils::read_tree("matrix:\n  ? [linux, arm]\n  : fast\n").unwrap();
        let matrix = root.node().get_field("matrix").unwrap();
        let err = matrix.node().to_json().unwrap_err();
        assert!(matches!(err, YamlError::Serialization(_)));
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        let err = YamlUtils::read_tree("execution: [unterminated").unwrap_err();
        assert!(matches!(err, YamlError::Parse(_)));
    }
}
