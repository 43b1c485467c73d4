//! Built-in, engine-level actions.
//!
//! Business actions (tabular I/O, file system, browser automation, dialogs) live in
//! the host and register through their own `ActionModule`s. The helpers below are
//! the argument-interpretation utilities those modules share.

use crate::error::ActionError;
use crate::registry::ActionModule;
use serde_json::Value;

mod control;

pub use control::ControlModule;

/// The modules `ActionRegistry::with_builtin_modules` discovers.
pub fn builtin_modules() -> Vec<Box<dyn ActionModule>> {
    vec![Box::new(ControlModule)]
}

/// Renders a value as plain text: strings unquoted, everything else as JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads a number given either as a JSON number or as a numeric string.
pub fn value_to_f64(name: &str, value: &Value) -> Result<f64, ActionError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ActionError::invalid(name, "number out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ActionError::invalid(name, format!("'{}' is not a number", s))),
        other => Err(ActionError::invalid(
            name,
            format!("expected a number, found {}", other),
        )),
    }
}
