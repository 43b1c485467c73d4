//! Action registry: capability lookup by action-type name.
//!
//! Registration is explicit. Each group of actions is an `ActionModule` that
//! registers its specs when `discover_all` runs; there is no reflection-based
//! discovery. The registry is an ordinary value handed to the executor, so tests
//! can build independent registries side by side.

use crate::error::RegistryError;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};
use tracing::{debug, info, warn};

mod action;
mod spec;

pub use action::*;
pub use spec::*;

/// What to do when an id is registered a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Last registration wins; the overwrite is logged.
    #[default]
    Overwrite,
    /// The second registration fails with `RegistryError::DuplicateAction`.
    Reject,
}

/// A group of actions registered together during discovery.
pub trait ActionModule: Send + Sync {
    fn name(&self) -> &str;
    fn register(&self, registry: &ActionRegistry) -> Result<(), RegistryError>;
}

pub struct ActionRegistry {
    actions: RwLock<AHashMap<String, Arc<ActionSpec>>>,
    modules: Vec<Box<dyn ActionModule>>,
    duplicate_policy: DuplicatePolicy,
    discovered: Once,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    /// An empty registry with no discovery modules.
    pub fn new() -> Self {
        Self {
            actions: RwLock::new(AHashMap::new()),
            modules: Vec::new(),
            duplicate_policy: DuplicatePolicy::default(),
            discovered: Once::new(),
        }
    }

    /// A registry whose discovery pass registers the built-in control actions.
    pub fn with_builtin_modules() -> Self {
        crate::actions::builtin_modules()
            .into_iter()
            .fold(Self::new(), |registry, module| registry.with_module(module))
    }

    pub fn with_module(mut self, module: Box<dyn ActionModule>) -> Self {
        self.modules.push(module);
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Stores `spec` under its id.
    pub fn register(&self, spec: ActionSpec) -> Result<(), RegistryError> {
        let mut actions = self.actions.write();
        if actions.contains_key(&spec.id) {
            match self.duplicate_policy {
                DuplicatePolicy::Reject => {
                    return Err(RegistryError::DuplicateAction(spec.id));
                }
                DuplicatePolicy::Overwrite => {
                    warn!(action = %spec.id, "action re-registered, previous entry overwritten");
                }
            }
        }
        debug!(action = %spec.id, category = %spec.category, "action registered");
        actions.insert(spec.id.clone(), Arc::new(spec));
        Ok(())
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<ActionSpec>> {
        self.actions.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.actions.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.actions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.read().is_empty()
    }

    /// Registered ids, sorted. With an allowlist, only ids present in both.
    pub fn list_enabled(&self, allowlist: Option<&AHashSet<String>>) -> Vec<String> {
        self.actions
            .read()
            .keys()
            .filter(|id| allowlist.is_none_or(|allowed| allowed.contains(*id)))
            .cloned()
            .sorted()
            .collect()
    }

    /// Registered ids grouped by category.
    pub fn list_by_category(&self) -> BTreeMap<String, Vec<String>> {
        self.actions
            .read()
            .values()
            .map(|spec| (spec.category.clone(), spec.id.clone()))
            .into_group_map()
            .into_iter()
            .map(|(category, ids)| (category, ids.into_iter().sorted().collect()))
            .collect()
    }

    /// Descriptors for every registered action, sorted by id.
    pub fn catalog(&self) -> Vec<ActionDescriptor> {
        self.actions
            .read()
            .values()
            .map(|spec| spec.descriptor())
            .sorted_by(|a, b| a.id.cmp(&b.id))
            .collect()
    }

    /// Runs every discovery module once. Later calls are no-ops. A module that fails
    /// (or panics) is logged and skipped; the remaining modules still register.
    pub fn discover_all(&self) {
        self.discovered.call_once(|| {
            for module in &self.modules {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| module.register(self)));
                match outcome {
                    Ok(Ok(())) => debug!(module = module.name(), "action module registered"),
                    Ok(Err(e)) => {
                        warn!(module = module.name(), error = %e, "action module skipped")
                    }
                    Err(_) => warn!(module = module.name(), "action module panicked, skipped"),
                }
            }
            info!(actions = self.len(), "action discovery complete");
        });
    }

    pub fn is_discovered(&self) -> bool {
        self.discovered.is_completed()
    }
}
