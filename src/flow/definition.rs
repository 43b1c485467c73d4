use super::document::deserialize_endpoint;
use crate::error::{FlowConversionError, FlowError};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub type StepId = String;

/// Raw key/value properties attached to a step, exactly as the editor produced them.
pub type Props = Map<String, Value>;

/// A graph of steps and ordering edges, submitted for a single execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub steps: Vec<Step>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// A single node of a flow: an action type plus its property map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    #[serde(rename = "type", alias = "defId")]
    pub action_type: String,
    #[serde(default)]
    pub props: Props,
}

/// A "must run before" constraint: `from` executes before `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    #[serde(deserialize_with = "deserialize_endpoint")]
    pub from: StepId,
    #[serde(deserialize_with = "deserialize_endpoint")]
    pub to: StepId,
}

impl Flow {
    pub fn new(steps: Vec<Step>, edges: Vec<Edge>) -> Self {
        Self { steps, edges }
    }

    /// Parses a flow document. See the `document` module for the accepted shapes.
    pub fn from_json(json: &str) -> Result<Self, FlowConversionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a flow document from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FlowConversionError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FlowConversionError::Validation(format!(
                "Could not read flow file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Checks structural well-formedness. Edges with dangling endpoints are not an
    /// error; they are dropped when the execution order is computed.
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.steps.is_empty() {
            return Err(FlowError::EmptyFlow);
        }
        let mut seen = AHashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(FlowError::DuplicateStepId(step.id.clone()));
            }
        }
        Ok(())
    }
}

impl Step {
    pub fn new(id: impl Into<String>, action_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action_type: action_type.into(),
            props: Props::new(),
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}
