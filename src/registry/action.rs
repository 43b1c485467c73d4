use crate::binder::BoundArgs;
use crate::context::{ExecutionContext, Resource};
use crate::error::ActionError;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// One declared parameter of an action's callable signature.
///
/// The binder walks these in order: a parameter with `has_default` may be left
/// unbound (the action applies its own default), any other parameter must be
/// resolved from an injection, a resource, or the step's props.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub has_default: bool,
}

impl Param {
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            has_default: false,
        }
    }

    pub fn optional(name: &str) -> Self {
        Self {
            name: name.to_string(),
            has_default: true,
        }
    }
}

/// Defines the contract every registered action type fulfils.
pub trait Action: Send + Sync {
    /// The callable signature used for argument binding.
    fn params(&self) -> Vec<Param>;

    fn invoke(&self, ctx: &ExecutionContext, args: BoundArgs)
    -> Result<ActionOutput, ActionError>;
}

/// Whatever an action hands back. The executor normalizes it into a step result.
pub enum ActionOutput {
    /// Nothing to report; treated as success.
    None,
    /// A raw value. A JSON object carrying a boolean `ok` field is read as a result
    /// record; anything else is wrapped as a successful result.
    Value(Value),
    /// An explicit result record.
    Report(StepReport),
    /// A handle to be kept by the context when its `ActionSpec` declares `provides_resource`.
    Resource(Arc<dyn Resource>),
}

impl fmt::Debug for ActionOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutput::None => write!(f, "None"),
            ActionOutput::Value(v) => f.debug_tuple("Value").field(v).finish(),
            ActionOutput::Report(r) => f.debug_tuple("Report").field(r).finish(),
            ActionOutput::Resource(_) => write!(f, "Resource(..)"),
        }
    }
}

impl From<Value> for ActionOutput {
    fn from(value: Value) -> Self {
        ActionOutput::Value(value)
    }
}

impl From<StepReport> for ActionOutput {
    fn from(report: StepReport) -> Self {
        ActionOutput::Report(report)
    }
}

/// A result record with an explicit success flag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepReport {
    pub ok: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
    /// Variables the action touched, surfaced as the step's preview.
    pub variables: Map<String, Value>,
}

impl StepReport {
    pub fn success(result: impl Into<Value>) -> Self {
        Self {
            ok: true,
            result: Some(result.into()),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }
}

/// An `Action` built from a closure and an explicit parameter list.
pub struct FnAction<F> {
    params: Vec<Param>,
    f: F,
}

impl<F> FnAction<F>
where
    F: Fn(&ExecutionContext, BoundArgs) -> Result<ActionOutput, ActionError> + Send + Sync,
{
    pub fn new(params: Vec<Param>, f: F) -> Self {
        Self { params, f }
    }
}

impl<F> Action for FnAction<F>
where
    F: Fn(&ExecutionContext, BoundArgs) -> Result<ActionOutput, ActionError> + Send + Sync,
{
    fn params(&self) -> Vec<Param> {
        self.params.clone()
    }

    fn invoke(
        &self,
        ctx: &ExecutionContext,
        args: BoundArgs,
    ) -> Result<ActionOutput, ActionError> {
        (self.f)(ctx, args)
    }
}
