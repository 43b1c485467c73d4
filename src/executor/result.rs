use crate::context::Resource;
use crate::registry::{ActionOutput, StepReport};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Lifecycle of an executor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// The outcome of one executed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub step_id: String,
    pub action_id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub variables: Map<String, Value>,
}

impl StepResult {
    pub(super) fn from_report(step_id: &str, action_id: &str, report: StepReport) -> Self {
        Self {
            step_id: step_id.to_string(),
            action_id: action_id.to_string(),
            ok: report.ok,
            result: report.result,
            error: report.error,
            variables: report.variables,
        }
    }

    pub(super) fn failed(step_id: &str, action_id: &str, error: String) -> Self {
        Self {
            step_id: step_id.to_string(),
            action_id: action_id.to_string(),
            ok: false,
            result: None,
            error: Some(error),
            variables: Map::new(),
        }
    }
}

/// The outcome of one `FlowExecutor::execute` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub ok: bool,
    pub state: RunState,
    /// Variable names held by the context just before cleanup.
    pub variable_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Every step that ran, including the one that failed.
    pub step_results: Vec<StepResult>,
}

impl ExecutionResult {
    pub(super) fn rejected(error: String) -> Self {
        Self {
            ok: false,
            state: RunState::Failed,
            variable_names: Vec::new(),
            message: None,
            error: Some(error),
            step_results: Vec::new(),
        }
    }
}

/// An action's output in canonical form.
pub(super) struct Normalized {
    pub report: StepReport,
    /// The value to keep when the action provides a resource.
    pub resource: Option<Arc<dyn Resource>>,
}

impl Normalized {
    /// A record's non-null `result` is what a resource provider hands over.
    fn from_report(report: StepReport) -> Self {
        let resource = report
            .result
            .clone()
            .filter(|v| !v.is_null())
            .map(|v| Arc::new(v) as Arc<dyn Resource>);
        Self { report, resource }
    }
}

pub(super) fn normalize(output: ActionOutput) -> Normalized {
    match output {
        ActionOutput::None => Normalized {
            report: StepReport {
                ok: true,
                ..StepReport::default()
            },
            resource: None,
        },
        ActionOutput::Report(report) => Normalized::from_report(report),
        ActionOutput::Resource(handle) => Normalized {
            report: StepReport {
                ok: true,
                ..StepReport::default()
            },
            resource: Some(handle),
        },
        ActionOutput::Value(Value::Object(record))
            if matches!(record.get("ok"), Some(Value::Bool(_))) =>
        {
            Normalized::from_report(report_from_record(record))
        }
        ActionOutput::Value(Value::Null) => Normalized {
            report: StepReport {
                ok: true,
                ..StepReport::default()
            },
            resource: None,
        },
        ActionOutput::Value(value) => Normalized {
            report: StepReport::success(value.clone()),
            resource: Some(Arc::new(value)),
        },
    }
}

fn report_from_record(mut record: Map<String, Value>) -> StepReport {
    let ok = record.get("ok").and_then(Value::as_bool).unwrap_or(false);
    let error = record.remove("error").map(|e| match e {
        Value::String(s) => s,
        other => other.to_string(),
    });
    let variables = match record.remove("variables") {
        Some(Value::Object(vars)) => vars,
        _ => Map::new(),
    };
    StepReport {
        ok,
        result: record.remove("result"),
        error,
        variables,
    }
}
