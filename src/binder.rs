//! Adapts a step's generic property map into the arguments an action declared.
//!
//! For every parameter in the action's signature, in order:
//!
//! 1. `context` is reserved: the live context is always handed to `Action::invoke`,
//!    so it is never read from props. A parameter named after a resource the context
//!    currently holds is bound to that resource. Injections win over props.
//! 2. A non-empty prop with the parameter's name is used. A string starting with `$`
//!    names a context variable; when the variable is absent the literal string is
//!    kept and the miss is reported in `Binding::unresolved`.
//! 3. A parameter with a default is left unbound.
//! 4. Anything else fails with `FlowError::MissingArgument`.
//!
//! Values are passed through untouched. Actions interpret string, number and
//! boolean forms of their own arguments.

use crate::context::{ExecutionContext, Resource};
use crate::error::{ActionError, FlowError};
use crate::flow::Step;
use crate::registry::Param;
use ahash::AHashMap;
use serde_json::Value;
use std::sync::Arc;

/// Parameter name that receives the live execution context.
pub const CONTEXT_PARAM: &str = "context";

/// Prefix marking a prop value as a reference to a context variable.
pub const VARIABLE_SIGIL: char = '$';

/// The arguments resolved for one invocation.
#[derive(Default, Clone)]
pub struct BoundArgs {
    values: AHashMap<String, Value>,
    resources: AHashMap<String, Arc<dyn Resource>>,
}

impl BoundArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn with_resource(mut self, name: &str, handle: Arc<dyn Resource>) -> Self {
        self.resources.insert(name.to_string(), handle);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The bound value, or `ActionError::MissingArgument` if the parameter was left
    /// unbound.
    pub fn require(&self, name: &str) -> Result<&Value, ActionError> {
        self.values
            .get(name)
            .ok_or_else(|| ActionError::MissingArgument(name.to_string()))
    }

    pub fn resource(&self, name: &str) -> Option<&Arc<dyn Resource>> {
        self.resources.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name) || self.resources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len() + self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for BoundArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundArgs")
            .field("values", &self.values)
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A `$name` reference that did not match any variable and was passed as a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub param: String,
    pub literal: String,
}

#[derive(Debug, Default)]
pub struct Binding {
    pub args: BoundArgs,
    pub unresolved: Vec<UnresolvedReference>,
}

pub struct ParameterBinder;

impl ParameterBinder {
    pub fn bind(
        params: &[Param],
        step: &Step,
        ctx: &ExecutionContext,
    ) -> Result<Binding, FlowError> {
        let mut binding = Binding::default();

        for param in params {
            if param.name == CONTEXT_PARAM {
                continue;
            }
            if let Some(handle) = ctx.get_resource(&param.name) {
                binding.args.resources.insert(param.name.clone(), handle);
                continue;
            }

            match step.props.get(&param.name).filter(|v| !is_empty(v)) {
                Some(raw) => {
                    let value = Self::resolve(raw, &param.name, ctx, &mut binding.unresolved);
                    binding.args.values.insert(param.name.clone(), value);
                }
                None if param.has_default => {}
                None => {
                    return Err(FlowError::MissingArgument {
                        param: param.name.clone(),
                        step_id: step.id.clone(),
                    });
                }
            }
        }

        Ok(binding)
    }

    fn resolve(
        raw: &Value,
        param: &str,
        ctx: &ExecutionContext,
        unresolved: &mut Vec<UnresolvedReference>,
    ) -> Value {
        let Some(variable) = raw.as_str().and_then(|s| s.strip_prefix(VARIABLE_SIGIL)) else {
            return raw.clone();
        };
        match ctx.get_variable(variable) {
            Some(value) => value,
            None => {
                unresolved.push(UnresolvedReference {
                    param: param.to_string(),
                    literal: raw.as_str().unwrap_or_default().to_string(),
                });
                raw.clone()
            }
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
