//! # FlowRunner - Flow Execution Engine
//!
//! **FlowRunner** executes directed graphs of named steps. Each step selects a
//! registered action by type name and carries a free-form property map; edges state
//! which step must run before which. One `execute` call runs the graph once and
//! returns a structured result, streaming progress notifications along the way.
//!
//! ## Core Workflow
//!
//! 1.  **Register Actions**: Build an `ActionRegistry` and register `ActionSpec`s
//!     directly or through `ActionModule`s that run on discovery.
//! 2.  **Describe a Flow**: Parse the editor's JSON with `Flow::from_json`, build one
//!     in code, or implement `IntoFlow` for your own document type.
//! 3.  **Execute**: Create a `FlowExecutor` with the registry (and optionally a
//!     notifier, allowlist and cycle policy), then call `execute`.
//!
//! Steps run sequentially in dependency order. Each step's props are bound to the
//! action's declared parameters (`$name` values read context variables), the
//! action is invoked, and its output is normalized. The first failure ends the run;
//! the run's context is always cleaned up before `execute` returns.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowrunner::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let registry = Arc::new(ActionRegistry::with_builtin_modules());
//!
//!     let flow = Flow::from_json(r#"{
//!         "steps": [
//!             { "id": "a", "type": "setVar", "props": { "name": "x", "value": "1" } },
//!             { "id": "b", "type": "getVar", "props": { "name": "x" } }
//!         ],
//!         "edges": [ { "from": "a", "to": "b" } ]
//!     }"#)?;
//!
//!     let executor = FlowExecutor::builder(registry)
//!         .with_notifier(|event: &Notification| {
//!             println!("[{}] {}: {}", event.level, event.step_id, event.message)
//!         })
//!         .build();
//!
//!     let result = executor.execute(&flow);
//!     println!("ok = {}, variables = {:?}", result.ok, result.variable_names);
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod binder;
pub mod context;
pub mod error;
pub mod executor;
pub mod flow;
pub mod notifier;
pub mod prelude;
pub mod registry;
