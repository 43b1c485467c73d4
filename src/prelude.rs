//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the
//! flowrunner crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowrunner::prelude::*;
//! use std::sync::Arc;
//!
//! # fn run_example() -> Result<()> {
//! let flow = Flow::from_file("path/to/flow.json")?;
//! let executor = FlowExecutor::new(Arc::new(ActionRegistry::with_builtin_modules()));
//! let result = executor.execute(&flow);
//! println!("Execution Result: {:?}", result);
//! # Ok(())
//! # }
//! ```

// Flow model
pub use crate::flow::{Edge, Flow, IntoFlow, Props, Step, StepId};

// Registry and action contract
pub use crate::registry::{
    Action, ActionDescriptor, ActionModule, ActionOutput, ActionRegistry, ActionSpec,
    DuplicatePolicy, FnAction, Param, ParamDescriptor, StepReport,
};

// Runtime
pub use crate::binder::{BoundArgs, ParameterBinder};
pub use crate::context::{ExecutionContext, Resource};
pub use crate::executor::{
    CyclePolicy, ExecutionResult, ExecutorConfig, FlowExecutor, RunState, StepResult,
    StopHandle,
};
pub use crate::notifier::{Level, Notification, Notifier};

// Error types
pub use crate::error::{ActionError, FlowConversionError, FlowError, RegistryError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
