use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

/// Severity of a progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Success,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Success => "success",
            Level::Warn => "warn",
            Level::Error => "error",
        };
        f.pad(s)
    }
}

/// A progress event emitted while a flow runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub step_id: String,
    pub message: String,
    pub level: Level,
    /// Variables the step reported touching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Map<String, Value>>,
}

impl Notification {
    pub fn new(step_id: &str, message: impl Into<String>, level: Level) -> Self {
        Self {
            step_id: step_id.to_string(),
            message: message.into(),
            level,
            preview: None,
        }
    }

    pub fn with_preview(mut self, preview: Map<String, Value>) -> Self {
        if !preview.is_empty() {
            self.preview = Some(preview);
        }
        self
    }
}

/// Caller-owned sink for progress events. Invoked synchronously on the thread
/// driving the run, in event order.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &Notification);
}

impl<F> Notifier for F
where
    F: Fn(&Notification) + Send + Sync,
{
    fn notify(&self, event: &Notification) {
        self(event)
    }
}

/// Discards every event.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: &Notification) {}
}

/// Delivers `event`, containing any panic raised by the sink.
pub(crate) fn dispatch(notifier: &dyn Notifier, event: &Notification) {
    if panic::catch_unwind(AssertUnwindSafe(|| notifier.notify(event))).is_err() {
        warn!(step_id = %event.step_id, "notifier panicked; event dropped");
    }
}
