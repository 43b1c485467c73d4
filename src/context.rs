//! Per-run mutable state shared by every step of one flow execution.
//!
//! The context holds two maps behind a single lock: user-level `variables` that
//! actions produce and consume, and engine-managed `resources` (browser drivers,
//! open handles) that must be released explicitly. A fresh context is created for
//! every `FlowExecutor::execute` call and cleaned up before it returns.

use crate::error::ActionError;
use ahash::AHashMap;
use itertools::Itertools;
use parking_lot::Mutex;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// A long-lived handle owned by the context until it is released.
///
/// `release` is the close/quit hook. It is invoked best-effort: errors and panics
/// are logged and swallowed so that teardown never masks the run's own outcome.
pub trait Resource: Send + Sync + 'static {
    fn release(&self) -> Result<(), ActionError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;
}

/// Plain values can be held as resources; they have nothing to close.
impl Resource for Value {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Default)]
struct ContextState {
    variables: AHashMap<String, Value>,
    resources: AHashMap<String, Arc<dyn Resource>>,
    current_step: Option<String>,
}

/// The variable and resource store for one run.
#[derive(Default)]
pub struct ExecutionContext {
    state: Mutex<ContextState>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Variables ---

    pub fn set_variable(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        debug!(variable = %name, "context variable set");
        self.state.lock().variables.insert(name, value);
    }

    /// Returns the variable, or `None` if it has never been set.
    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.state.lock().variables.get(name).cloned()
    }

    pub fn get_variable_or(&self, name: &str, default: Value) -> Value {
        self.get_variable(name).unwrap_or(default)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.state.lock().variables.contains_key(name)
    }

    /// A snapshot copy of every variable; later mutations of the context are not
    /// reflected in the returned map, and vice versa.
    pub fn list_variables(&self) -> AHashMap<String, Value> {
        self.state.lock().variables.clone()
    }

    /// Variable names in lexical order.
    pub fn variable_names(&self) -> Vec<String> {
        self.state.lock().variables.keys().cloned().sorted().collect()
    }

    // --- Resources ---

    /// Stores a resource under `key`. A handle already held under the same key is
    /// released first, so at most one handle per key is live.
    pub fn set_resource(&self, key: impl Into<String>, handle: Arc<dyn Resource>) {
        let key = key.into();
        let previous = self.state.lock().resources.insert(key.clone(), handle);
        debug!(resource = %key, "context resource set");
        if let Some(previous) = previous {
            release_quietly(&key, previous);
        }
    }

    pub fn get_resource(&self, key: &str) -> Option<Arc<dyn Resource>> {
        self.state.lock().resources.get(key).cloned()
    }

    pub fn has_resource(&self, key: &str) -> bool {
        self.state.lock().resources.contains_key(key)
    }

    pub fn resource_keys(&self) -> Vec<String> {
        self.state.lock().resources.keys().cloned().sorted().collect()
    }

    /// Removes the resource and invokes its release hook. Never fails.
    pub fn release_resource(&self, key: &str) {
        let removed = self.state.lock().resources.remove(key);
        if let Some(handle) = removed {
            release_quietly(key, handle);
        }
    }

    pub fn release_all_resources(&self) {
        // Drain under the lock, release outside it: a release hook may touch the context.
        let drained: Vec<(String, Arc<dyn Resource>)> =
            self.state.lock().resources.drain().collect();
        for (key, handle) in drained {
            release_quietly(&key, handle);
        }
    }

    /// Releases every resource, then clears every variable.
    pub fn cleanup(&self) {
        debug!("cleaning up execution context");
        self.release_all_resources();
        let mut state = self.state.lock();
        state.variables.clear();
        state.current_step = None;
    }

    // --- Bookkeeping ---

    pub fn current_step(&self) -> Option<String> {
        self.state.lock().current_step.clone()
    }

    pub(crate) fn set_current_step(&self, step_id: Option<&str>) {
        self.state.lock().current_step = step_id.map(str::to_string);
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ExecutionContext")
            .field("variables", &state.variables)
            .field("resources", &state.resources.keys().collect::<Vec<_>>())
            .field("current_step", &state.current_step)
            .finish()
    }
}

fn release_quietly(key: &str, handle: Arc<dyn Resource>) {
    match panic::catch_unwind(AssertUnwindSafe(|| handle.release())) {
        Ok(Ok(())) => debug!(resource = %key, "resource released"),
        Ok(Err(e)) => warn!(resource = %key, error = %e, "resource release failed"),
        Err(_) => warn!(resource = %key, "resource release panicked"),
    }
}
