//! Common test utilities: spy resources, a recording notifier and a registry of
//! small test actions.
use flowrunner::prelude::*;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A resource that counts how often it was released.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct SpyResource {
    releases: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl SpyResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl Resource for SpyResource {
    fn release(&self) -> std::result::Result<(), ActionError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A resource whose release hook errors or panics.
#[allow(dead_code)]
pub struct BrokenResource {
    pub panics: bool,
}

impl Resource for BrokenResource {
    fn release(&self) -> std::result::Result<(), ActionError> {
        if self.panics {
            panic!("release hook exploded");
        }
        Err(ActionError::Failed("driver already gone".to_string()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Keeps every notification it receives, in order.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Notification>>>,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|e| format!("{}:{}", e.step_id, e.message))
            .collect()
    }

    pub fn at_level(&self, level: Level) -> Vec<Notification> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: &Notification) {
        self.events.lock().push(event.clone());
    }
}

/// Wraps a closure as an action.
#[allow(dead_code)]
pub fn action<F>(params: Vec<Param>, f: F) -> FnAction<F>
where
    F: Fn(&ExecutionContext, BoundArgs) -> std::result::Result<ActionOutput, ActionError>
        + Send
        + Sync,
{
    FnAction::new(params, f)
}

/// Registers the test actions on `registry`:
///
/// - `noop`: does nothing
/// - `emit`: sets variable `name` to `value`
/// - `record`: returns its `value` argument
/// - `fail`: returns an action error ("boom")
/// - `explode`: panics ("kaboom")
/// - `reportFailure`: returns a `{ok: false}` record
/// - `openSpy`: provides `spy` as the `driver` resource
/// - `useDriver`: requires the `driver` resource
#[allow(dead_code)]
pub fn register_test_actions(registry: &ActionRegistry, spy: &SpyResource) {
    let spy = spy.clone();
    let specs = vec![
        ActionSpec::new("noop", "test", action(vec![], |_, _| Ok(ActionOutput::None))),
        ActionSpec::new(
            "emit",
            "test",
            action(
                vec![
                    Param::required("context"),
                    Param::required("name"),
                    Param::required("value"),
                ],
                |ctx, args| {
                    let name = flowrunner::actions::value_to_string(args.require("name")?);
                    let value = args.require("value")?.clone();
                    ctx.set_variable(name.clone(), value.clone());
                    Ok(StepReport::success(json!(name))
                        .with_variable(name, value)
                        .into())
                },
            ),
        ),
        ActionSpec::new(
            "record",
            "test",
            action(vec![Param::required("value")], |_, args| {
                Ok(args.require("value")?.clone().into())
            }),
        ),
        ActionSpec::new(
            "fail",
            "test",
            action(vec![], |_, _| Err(ActionError::Failed("boom".to_string()))),
        ),
        ActionSpec::new(
            "explode",
            "test",
            action(vec![], |_, _| panic!("kaboom")),
        ),
        ActionSpec::new(
            "reportFailure",
            "test",
            action(vec![], |_, _| {
                Ok(json!({ "ok": false, "error": "bad input" }).into())
            }),
        ),
        ActionSpec::new(
            "openSpy",
            "resources",
            action(vec![], move |_, _| {
                Ok(ActionOutput::Resource(Arc::new(spy.clone())))
            }),
        )
        .provides_resource("driver"),
        ActionSpec::new(
            "useDriver",
            "resources",
            action(vec![Param::required("driver")], |_, args| {
                args.resource("driver")
                    .ok_or_else(|| ActionError::MissingResource("driver".to_string()))?;
                Ok(Value::String("driven".to_string()).into())
            }),
        ),
    ];

    for spec in specs {
        registry
            .register(spec)
            .expect("test action registration should succeed");
    }
}

/// A registry holding only the test actions.
#[allow(dead_code)]
pub fn test_registry(spy: &SpyResource) -> Arc<ActionRegistry> {
    let registry = ActionRegistry::new();
    register_test_actions(&registry, spy);
    Arc::new(registry)
}

/// A registry holding the built-in control actions plus the test actions.
#[allow(dead_code)]
pub fn full_registry(spy: &SpyResource) -> Arc<ActionRegistry> {
    let registry = ActionRegistry::with_builtin_modules();
    register_test_actions(&registry, spy);
    Arc::new(registry)
}

/// A chain flow: each step runs after the previous one.
#[allow(dead_code)]
pub fn chain(steps: Vec<Step>) -> Flow {
    let edges = steps
        .windows(2)
        .map(|pair| Edge::new(pair[0].id.clone(), pair[1].id.clone()))
        .collect();
    Flow::new(steps, edges)
}

/// An editor-saved document: `defId` step types and `{step, port}` endpoints.
#[allow(dead_code)]
pub const EDITOR_FLOW_JSON: &str = r#"{
    "steps": [
        { "id": "check", "defId": "assertVar", "props": { "name": "greeting", "equals": "hello" } },
        { "id": "set", "defId": "setVar", "props": { "name": "greeting", "value": "hello" } },
        { "id": "copy", "defId": "getVar", "props": { "name": "greeting", "target": "copied" } },
        { "id": "note", "defId": "log", "props": { "message": "$copied", "level": "" } }
    ],
    "edges": [
        { "from": { "step": "set", "port": "out" }, "to": { "step": "check", "port": "in" } },
        { "from": "check", "to": { "step": "copy", "port": "in" } },
        { "from": { "step": "copy", "port": "out" }, "to": "note" }
    ]
}"#;
