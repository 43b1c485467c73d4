//! The flow executor: orders steps, binds and invokes actions, and owns the
//! per-run context from creation to cleanup.
//!
//! Execution is strictly sequential on the calling thread. The executor is
//! fail-fast: the first failing step ends the run. Cancellation is cooperative and
//! only observed between steps, through `stop()` or a `StopHandle`.

use crate::binder::ParameterBinder;
use crate::context::ExecutionContext;
use crate::error::{ConfigError, FlowError};
use crate::flow::{Flow, Step};
use crate::notifier::{Level, Notification, Notifier, NullNotifier, dispatch};
use crate::registry::{ActionRegistry, ActionSpec};
use ahash::AHashSet;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

mod ordering;
mod result;

pub use ordering::{CyclePolicy, ExecutionOrder, execution_order};
pub use result::{ExecutionResult, RunState, StepResult};

use result::normalize;

/// Host-tunable executor settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutorConfig {
    pub cycle_policy: CyclePolicy,
    /// When set, only these action types may run.
    pub allowlist: Option<AHashSet<String>>,
}

impl ExecutorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }
}

/// A cloneable cancellation flag shared with the executor.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct FlowExecutor {
    registry: Arc<ActionRegistry>,
    config: ExecutorConfig,
    notifier: Arc<dyn Notifier>,
    stop: StopHandle,
    state: Mutex<RunState>,
}

pub struct FlowExecutorBuilder {
    registry: Arc<ActionRegistry>,
    config: ExecutorConfig,
    notifier: Arc<dyn Notifier>,
    stop: StopHandle,
}

impl FlowExecutorBuilder {
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self {
            registry,
            config: ExecutorConfig::default(),
            notifier: Arc::new(NullNotifier),
            stop: StopHandle::new(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.config.cycle_policy = policy;
        self
    }

    pub fn with_allowlist<I, S>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowlist = Some(allowed.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Shares an existing cancellation flag, e.g. one captured by the notifier.
    pub fn with_stop_handle(mut self, handle: StopHandle) -> Self {
        self.stop = handle;
        self
    }

    pub fn build(self) -> FlowExecutor {
        FlowExecutor {
            registry: self.registry,
            config: self.config,
            notifier: self.notifier,
            stop: self.stop,
            state: Mutex::new(RunState::Idle),
        }
    }
}

impl FlowExecutor {
    pub fn builder(registry: Arc<ActionRegistry>) -> FlowExecutorBuilder {
        FlowExecutorBuilder::new(registry)
    }

    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self::builder(registry).build()
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    /// Requests cancellation. Honoured before the next step starts.
    pub fn stop(&self) {
        info!("stop requested");
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Runs `flow` once. Never panics and never returns an error: every failure is
    /// reported through `ExecutionResult::error`, after the run's context has been
    /// cleaned up.
    pub fn execute(&self, flow: &Flow) -> ExecutionResult {
        self.stop.reset();
        *self.state.lock() = RunState::Running;

        if let Err(e) = flow.validate() {
            warn!(error = %e, "flow rejected");
            *self.state.lock() = RunState::Failed;
            return ExecutionResult::rejected(e.to_string());
        }

        self.registry.discover_all();

        let ctx = ExecutionContext::new();
        let mut step_results = Vec::new();
        let outcome = self.run(flow, &ctx, &mut step_results);

        let variable_names = ctx.variable_names();
        ctx.cleanup();

        let state = match &outcome {
            Ok(()) => RunState::Completed,
            Err(FlowError::Cancelled) => RunState::Cancelled,
            Err(_) => RunState::Failed,
        };
        *self.state.lock() = state;

        match outcome {
            Ok(()) => {
                info!(steps = step_results.len(), "flow completed");
                ExecutionResult {
                    ok: true,
                    state,
                    variable_names,
                    message: Some(format!(
                        "Flow completed successfully ({} steps)",
                        step_results.len()
                    )),
                    error: None,
                    step_results,
                }
            }
            Err(e) => {
                warn!(error = %e, state = ?state, "flow did not complete");
                ExecutionResult {
                    ok: false,
                    state,
                    variable_names,
                    message: None,
                    error: Some(e.to_string()),
                    step_results,
                }
            }
        }
    }

    fn run(
        &self,
        flow: &Flow,
        ctx: &ExecutionContext,
        step_results: &mut Vec<StepResult>,
    ) -> Result<(), FlowError> {
        let order = execution_order(flow, self.config.cycle_policy)?;
        if order.fell_back {
            self.notify(Notification::new(
                "",
                "Flow edges contain a cycle; running steps in declaration order",
                Level::Warn,
            ));
        }

        info!(steps = order.steps.len(), "starting flow");

        for step in order.steps {
            if self.stop.is_stopped() {
                info!(step_id = %step.id, "cancellation observed, remaining steps skipped");
                return Err(FlowError::Cancelled);
            }

            ctx.set_current_step(Some(&step.id));
            self.notify(Notification::new(
                &step.id,
                format!("Running: {}", step.action_type),
                Level::Info,
            ));

            match self.run_step(step, ctx) {
                Ok(result) => {
                    debug!(step_id = %step.id, action = %step.action_type, "step completed");
                    self.notify(
                        Notification::new(&step.id, "Completed", Level::Success)
                            .with_preview(result.variables.clone()),
                    );
                    step_results.push(result);
                }
                Err((e, result)) => {
                    warn!(step_id = %step.id, action = %step.action_type, error = %e, "step failed");
                    self.notify(
                        Notification::new(&step.id, format!("Error: {}", e), Level::Error)
                            .with_preview(result.variables.clone()),
                    );
                    step_results.push(result);
                    return Err(e);
                }
            }
        }

        ctx.set_current_step(None);
        Ok(())
    }

    /// Resolves, binds and invokes one step. On failure, returns the run-fatal error
    /// together with the step's failed result.
    fn run_step(
        &self,
        step: &Step,
        ctx: &ExecutionContext,
    ) -> Result<StepResult, (FlowError, StepResult)> {
        let fail = |e: FlowError| {
            let result = StepResult::failed(&step.id, &step.action_type, e.to_string());
            (e, result)
        };

        let spec = self.resolve_action(step).map_err(fail)?;
        let binding = ParameterBinder::bind(&spec.action.params(), step, ctx).map_err(fail)?;

        for reference in &binding.unresolved {
            debug!(
                step_id = %step.id,
                param = %reference.param,
                literal = %reference.literal,
                "variable reference unresolved, using literal"
            );
            self.notify(Notification::new(
                &step.id,
                format!(
                    "Argument '{}' uses literal '{}': no such variable",
                    reference.param, reference.literal
                ),
                Level::Debug,
            ));
        }

        let invoked =
            panic::catch_unwind(AssertUnwindSafe(|| spec.action.invoke(ctx, binding.args)));
        let output = match invoked {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(fail(runtime_error(&spec, step, e.to_string()))),
            Err(payload) => return Err(fail(runtime_error(&spec, step, panic_message(payload)))),
        };

        let normalized = normalize(output);
        if let Some(key) = &spec.provides_resource {
            match normalized.resource {
                Some(handle) => ctx.set_resource(key.clone(), handle),
                None => debug!(step_id = %step.id, resource = %key, "action returned no resource"),
            }
        }
        if spec.releases_all_resources {
            ctx.release_all_resources();
        }

        let report = normalized.report;
        if report.ok {
            Ok(StepResult::from_report(&step.id, &spec.id, report))
        } else {
            let e = FlowError::StepFailed {
                action_id: spec.id.clone(),
                step_id: step.id.clone(),
                message: report
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            };
            Err((e, StepResult::from_report(&step.id, &spec.id, report)))
        }
    }

    fn resolve_action(&self, step: &Step) -> Result<Arc<ActionSpec>, FlowError> {
        let allowed = self
            .config
            .allowlist
            .as_ref()
            .is_none_or(|allowlist| allowlist.contains(&step.action_type));

        self.registry
            .lookup(&step.action_type)
            .filter(|_| allowed)
            .ok_or_else(|| FlowError::UnknownActionType {
                type_name: step.action_type.clone(),
                step_id: step.id.clone(),
            })
    }

    fn notify(&self, event: Notification) {
        dispatch(self.notifier.as_ref(), &event);
    }
}

fn runtime_error(spec: &ActionSpec, step: &Step, message: String) -> FlowError {
    FlowError::ActionRuntime {
        action_id: spec.id.clone(),
        step_id: step.id.clone(),
        message,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
