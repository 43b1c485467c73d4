use thiserror::Error;

/// Errors that end a flow run. The executor never returns these directly; they are
/// rendered into the `error` field of an `ExecutionResult`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("The flow contains no steps")]
    EmptyFlow,

    #[error("Step id '{0}' is declared more than once")]
    DuplicateStepId(String),

    #[error("Step '{step_id}' references an unregistered action type: '{type_name}'")]
    UnknownActionType { type_name: String, step_id: String },

    #[error("Step '{step_id}' is missing required argument '{param}'")]
    MissingArgument { param: String, step_id: String },

    #[error("Action '{action_id}' failed in step '{step_id}': {message}")]
    ActionRuntime {
        action_id: String,
        step_id: String,
        message: String,
    },

    #[error("Step '{step_id}' ({action_id}) reported failure: {message}")]
    StepFailed {
        action_id: String,
        step_id: String,
        message: String,
    },

    #[error("The flow contains a cycle involving steps: {}", unresolved.join(", "))]
    CyclicGraph { unresolved: Vec<String> },

    #[error("Execution cancelled")]
    Cancelled,
}

/// Errors raised by an action implementation while it runs.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Invalid value for argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    #[error("Argument '{0}' was not bound")]
    MissingArgument(String),

    #[error("Variable '{0}' not found in the execution context")]
    MissingVariable(String),

    #[error("Resource '{0}' is not available")]
    MissingResource(String),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ActionError {
    pub fn invalid(name: &str, message: impl Into<String>) -> Self {
        ActionError::InvalidArgument {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while populating an `ActionRegistry`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Action '{0}' is already registered")]
    DuplicateAction(String),

    #[error("Action module '{module}' failed to register: {message}")]
    Module { module: String, message: String },
}

/// Errors that can occur when converting an external document into a `Flow`.
#[derive(Error, Debug)]
pub enum FlowConversionError {
    #[error("Failed to parse flow JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid flow document: {0}")]
    Validation(String),
}

/// Errors that can occur when loading an `ExecutorConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
}
