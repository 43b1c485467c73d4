use super::action::Action;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// UI-facing description of one parameter. Documentation only; the engine binds
/// arguments from the action's `params()` signature, not from this schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamDescriptor {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl ParamDescriptor {
    pub fn new(key: &str, label: &str, kind: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: kind.to_string(),
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }
}

/// The registered description and callable for one action type.
#[derive(Clone)]
pub struct ActionSpec {
    /// Equal to the step `type` that selects this action.
    pub id: String,
    pub category: String,
    pub name: String,
    pub description: String,
    pub schema: Vec<ParamDescriptor>,
    pub action: Arc<dyn Action>,
    /// Resource key under which a non-null return value is kept by the context.
    pub provides_resource: Option<String>,
    /// Release every context resource right after this action runs.
    pub releases_all_resources: bool,
}

impl ActionSpec {
    pub fn new(id: &str, category: &str, action: impl Action + 'static) -> Self {
        Self {
            id: id.to_string(),
            category: category.to_string(),
            name: id.to_string(),
            description: String::new(),
            schema: Vec::new(),
            action: Arc::new(action),
            provides_resource: None,
            releases_all_resources: false,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_schema(mut self, schema: Vec<ParamDescriptor>) -> Self {
        self.schema = schema;
        self
    }

    pub fn provides_resource(mut self, key: &str) -> Self {
        self.provides_resource = Some(key.to_string());
        self
    }

    pub fn releases_all_resources(mut self) -> Self {
        self.releases_all_resources = true;
        self
    }

    pub fn descriptor(&self) -> ActionDescriptor {
        ActionDescriptor {
            id: self.id.clone(),
            category: self.category.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            schema: self.schema.clone(),
        }
    }
}

impl fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSpec")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("provides_resource", &self.provides_resource)
            .field("releases_all_resources", &self.releases_all_resources)
            .finish_non_exhaustive()
    }
}

/// Serializable catalog entry for editor palettes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub id: String,
    pub category: String,
    pub name: String,
    pub description: String,
    pub schema: Vec<ParamDescriptor>,
}
