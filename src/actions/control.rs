use super::{value_to_f64, value_to_string};
use crate::binder::BoundArgs;
use crate::context::ExecutionContext;
use crate::error::{ActionError, RegistryError};
use crate::registry::{
    Action, ActionModule, ActionOutput, ActionRegistry, ActionSpec, Param, ParamDescriptor,
    StepReport,
};
use serde_json::{Value, json};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const CATEGORY: &str = "control";

/// Variables, pauses, logging, assertions and resource release.
pub struct ControlModule;

impl ActionModule for ControlModule {
    fn name(&self) -> &str {
        "control"
    }

    fn register(&self, registry: &ActionRegistry) -> Result<(), RegistryError> {
        registry.register(
            ActionSpec::new("setVar", CATEGORY, SetVar)
                .with_name("Set variable")
                .with_description("Stores a value in a context variable.")
                .with_schema(vec![
                    ParamDescriptor::new("name", "Variable", "text").required(),
                    ParamDescriptor::new("value", "Value", "text").required(),
                ]),
        )?;
        registry.register(
            ActionSpec::new("getVar", CATEGORY, GetVar)
                .with_name("Read variable")
                .with_description("Reads a context variable, optionally copying it.")
                .with_schema(vec![
                    ParamDescriptor::new("name", "Variable", "text").required(),
                    ParamDescriptor::new("target", "Copy to", "text"),
                ]),
        )?;
        registry.register(
            ActionSpec::new("pause", CATEGORY, Pause)
                .with_name("Pause")
                .with_description("Blocks the run for a number of seconds.")
                .with_schema(vec![
                    ParamDescriptor::new("seconds", "Seconds", "number").placeholder("1"),
                ]),
        )?;
        registry.register(
            ActionSpec::new("log", CATEGORY, Log)
                .with_name("Log message")
                .with_schema(vec![
                    ParamDescriptor::new("message", "Message", "text").required(),
                    ParamDescriptor::new("level", "Level", "select")
                        .options(&["debug", "info", "warn", "error"]),
                ]),
        )?;
        registry.register(
            ActionSpec::new("assertVar", CATEGORY, AssertVar)
                .with_name("Check variable")
                .with_description("Fails the run unless the variable exists (and matches).")
                .with_schema(vec![
                    ParamDescriptor::new("name", "Variable", "text").required(),
                    ParamDescriptor::new("equals", "Expected value", "text"),
                ]),
        )?;
        registry.register(
            ActionSpec::new("releaseResources", CATEGORY, ReleaseResources)
                .with_name("Release resources")
                .with_description("Closes every open resource, such as browser sessions.")
                .releases_all_resources(),
        )?;
        Ok(())
    }
}

fn required_string(args: &BoundArgs, name: &str) -> Result<String, ActionError> {
    args.require(name).map(value_to_string)
}

struct SetVar;

impl Action for SetVar {
    fn params(&self) -> Vec<Param> {
        vec![
            Param::required("context"),
            Param::required("name"),
            Param::required("value"),
        ]
    }

    fn invoke(
        &self,
        ctx: &ExecutionContext,
        args: BoundArgs,
    ) -> Result<ActionOutput, ActionError> {
        let name = required_string(&args, "name")?;
        let value = args.require("value")?.clone();
        ctx.set_variable(name.clone(), value.clone());
        Ok(StepReport::success(json!(name))
            .with_variable(name, value)
            .into())
    }
}

struct GetVar;

impl Action for GetVar {
    fn params(&self) -> Vec<Param> {
        vec![
            Param::required("context"),
            Param::required("name"),
            Param::optional("target"),
        ]
    }

    fn invoke(
        &self,
        ctx: &ExecutionContext,
        args: BoundArgs,
    ) -> Result<ActionOutput, ActionError> {
        let name = required_string(&args, "name")?;
        let value = ctx
            .get_variable(&name)
            .ok_or_else(|| ActionError::MissingVariable(name.clone()))?;

        let mut report = StepReport::success(value.clone());
        if let Some(target) = args.get("target").map(value_to_string) {
            ctx.set_variable(target.clone(), value.clone());
            report = report.with_variable(target, value);
        }
        Ok(report.into())
    }
}

struct Pause;

impl Action for Pause {
    fn params(&self) -> Vec<Param> {
        vec![Param::optional("seconds")]
    }

    fn invoke(
        &self,
        _ctx: &ExecutionContext,
        args: BoundArgs,
    ) -> Result<ActionOutput, ActionError> {
        let seconds = match args.get("seconds") {
            Some(value) => value_to_f64("seconds", value)?,
            None => 1.0,
        };
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(ActionError::invalid(
                "seconds",
                "must be a positive number of seconds",
            ));
        }
        let duration = Duration::try_from_secs_f64(seconds)
            .map_err(|e| ActionError::invalid("seconds", e.to_string()))?;
        debug!(seconds, "pausing");
        thread::sleep(duration);
        Ok(Value::String(format!("Paused for {} seconds", seconds)).into())
    }
}

struct Log;

impl Action for Log {
    fn params(&self) -> Vec<Param> {
        vec![Param::required("message"), Param::optional("level")]
    }

    fn invoke(
        &self,
        _ctx: &ExecutionContext,
        args: BoundArgs,
    ) -> Result<ActionOutput, ActionError> {
        let message = required_string(&args, "message")?;
        let level = args
            .get("level")
            .map(value_to_string)
            .unwrap_or_else(|| "info".to_string());
        match level.as_str() {
            "debug" => debug!(target: "flowrunner::flow", "{}", message),
            "info" => info!(target: "flowrunner::flow", "{}", message),
            "warn" => warn!(target: "flowrunner::flow", "{}", message),
            "error" => error!(target: "flowrunner::flow", "{}", message),
            other => {
                return Err(ActionError::invalid(
                    "level",
                    format!("unknown log level '{}'", other),
                ));
            }
        }
        Ok(Value::String(message).into())
    }
}

struct AssertVar;

impl Action for AssertVar {
    fn params(&self) -> Vec<Param> {
        vec![
            Param::required("context"),
            Param::required("name"),
            Param::optional("equals"),
        ]
    }

    fn invoke(
        &self,
        ctx: &ExecutionContext,
        args: BoundArgs,
    ) -> Result<ActionOutput, ActionError> {
        let name = required_string(&args, "name")?;
        let Some(actual) = ctx.get_variable(&name) else {
            return Ok(StepReport::failure(format!("Variable '{}' is not set", name)).into());
        };
        if let Some(expected) = args.get("equals") {
            let (actual_text, expected_text) = (value_to_string(&actual), value_to_string(expected));
            if actual_text != expected_text {
                return Ok(StepReport::failure(format!(
                    "Variable '{}' is '{}', expected '{}'",
                    name, actual_text, expected_text
                ))
                .into());
            }
        }
        Ok(StepReport::success(actual).into())
    }
}

struct ReleaseResources;

impl Action for ReleaseResources {
    fn params(&self) -> Vec<Param> {
        vec![Param::required("context")]
    }

    fn invoke(
        &self,
        ctx: &ExecutionContext,
        _args: BoundArgs,
    ) -> Result<ActionOutput, ActionError> {
        let open = ctx.resource_keys();
        Ok(StepReport::success(json!(open)).into())
    }
}
