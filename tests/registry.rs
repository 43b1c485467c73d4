//! Registry tests: duplicate handling, listing and module discovery.
mod common;
use ahash::AHashSet;
use common::*;
use flowrunner::error::RegistryError;
use flowrunner::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn noop_spec(id: &str, category: &str) -> ActionSpec {
    ActionSpec::new(id, category, action(vec![], |_, _| Ok(ActionOutput::None)))
}

struct CountingModule {
    calls: Arc<AtomicUsize>,
}

impl ActionModule for CountingModule {
    fn name(&self) -> &str {
        "counting"
    }

    fn register(&self, registry: &ActionRegistry) -> std::result::Result<(), RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        registry.register(noop_spec("counted", "test"))
    }
}

struct FailingModule;

impl ActionModule for FailingModule {
    fn name(&self) -> &str {
        "failing"
    }

    fn register(&self, _registry: &ActionRegistry) -> std::result::Result<(), RegistryError> {
        Err(RegistryError::Module {
            module: "failing".to_string(),
            message: "vendor SDK not installed".to_string(),
        })
    }
}

struct PanickingModule;

impl ActionModule for PanickingModule {
    fn name(&self) -> &str {
        "panicking"
    }

    fn register(&self, _registry: &ActionRegistry) -> std::result::Result<(), RegistryError> {
        panic!("module import crashed")
    }
}

#[test]
fn test_duplicate_registration_overwrites_by_default() {
    let registry = ActionRegistry::new();
    registry.register(noop_spec("x", "first")).unwrap();
    registry.register(noop_spec("x", "second")).unwrap();

    assert_eq!(registry.len(), 1);
    let spec = registry.lookup("x").expect("x is registered");
    assert_eq!(spec.category, "second");
}

#[test]
fn test_duplicate_registration_rejected_when_configured() {
    let registry = ActionRegistry::new().with_duplicate_policy(DuplicatePolicy::Reject);
    registry.register(noop_spec("x", "first")).unwrap();

    let err = registry.register(noop_spec("x", "second")).unwrap_err();
    assert_eq!(err, RegistryError::DuplicateAction("x".to_string()));
    assert_eq!(registry.lookup("x").map(|s| s.category.clone()), Some("first".to_string()));
}

#[test]
fn test_lookup_unknown_id() {
    let registry = ActionRegistry::new();
    assert!(registry.lookup("missing").is_none());
    assert!(!registry.contains("missing"));
    assert!(registry.is_empty());
}

#[test]
fn test_list_enabled() {
    let registry = ActionRegistry::new();
    for id in ["zeta", "alpha", "mid"] {
        registry.register(noop_spec(id, "test")).unwrap();
    }

    assert_eq!(registry.list_enabled(None), vec!["alpha", "mid", "zeta"]);

    let allowlist: AHashSet<String> = ["zeta", "alpha", "unregistered"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(registry.list_enabled(Some(&allowlist)), vec!["alpha", "zeta"]);

    let empty = AHashSet::new();
    assert!(registry.list_enabled(Some(&empty)).is_empty());
}

#[test]
fn test_list_by_category_and_catalog() {
    let registry = ActionRegistry::new();
    registry.register(noop_spec("readCsv", "excel")).unwrap();
    registry.register(noop_spec("click", "web")).unwrap();
    registry
        .register(
            noop_spec("writeCsv", "excel")
                .with_name("Write CSV")
                .with_description("Writes rows to a file.")
                .with_schema(vec![ParamDescriptor::new("path", "File", "file").required()]),
        )
        .unwrap();

    let grouped = registry.list_by_category();
    assert_eq!(grouped["excel"], vec!["readCsv", "writeCsv"]);
    assert_eq!(grouped["web"], vec!["click"]);

    let catalog = registry.catalog();
    let ids: Vec<_> = catalog.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["click", "readCsv", "writeCsv"]);
    assert_eq!(catalog[0].name, "click");
    assert_eq!(catalog[2].name, "Write CSV");
    assert!(catalog[2].schema[0].required);
}

#[test]
fn test_discover_all_runs_modules_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ActionRegistry::new().with_module(Box::new(CountingModule {
        calls: calls.clone(),
    }));

    assert!(!registry.is_discovered());
    assert!(!registry.contains("counted"));

    registry.discover_all();
    registry.discover_all();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(registry.is_discovered());
    assert!(registry.contains("counted"));
}

#[test]
fn test_failing_modules_are_skipped() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ActionRegistry::new()
        .with_module(Box::new(FailingModule))
        .with_module(Box::new(PanickingModule))
        .with_module(Box::new(CountingModule {
            calls: calls.clone(),
        }));

    registry.discover_all();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(registry.list_enabled(None), vec!["counted"]);
}

#[test]
fn test_builtin_catalog() {
    let registry = ActionRegistry::with_builtin_modules();
    assert!(registry.is_empty());
    registry.discover_all();

    assert_eq!(
        registry.list_enabled(None),
        vec!["assertVar", "getVar", "log", "pause", "releaseResources", "setVar"]
    );
    let by_category = registry.list_by_category();
    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category["control"].len(), 6);

    let set_var = registry.lookup("setVar").unwrap();
    assert_eq!(set_var.name, "Set variable");
    assert_eq!(set_var.schema.len(), 2);
    assert!(registry.lookup("releaseResources").unwrap().releases_all_resources);

    // Defaulted parameters are not advertised as required.
    let pause = registry.lookup("pause").unwrap();
    assert_eq!(pause.schema[0].key, "seconds");
    assert!(!pause.schema[0].required);
}

#[test]
fn test_descriptor_serializes_schema_type() {
    let descriptor = ParamDescriptor::new("level", "Level", "select").options(&["info", "warn"]);
    let value = serde_json::to_value(&descriptor).unwrap();
    assert_eq!(value["type"], "select");
    assert_eq!(value["options"], serde_json::json!(["info", "warn"]));
    assert!(value.get("placeholder").is_none());
}

#[test]
fn test_independent_registries() {
    let spy = SpyResource::new();
    let populated = test_registry(&spy);
    let empty = ActionRegistry::new();

    assert!(populated.contains("noop"));
    assert!(!empty.contains("noop"));
}
