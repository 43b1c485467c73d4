//! Wire-format helpers for flow documents saved by the graph editor.
//!
//! The editor stores edge endpoints as `{ "step": "<id>", "port": "out" }` objects,
//! while hand-written flows use the bare step id. Both deserialize into a plain
//! `StepId`; the port is not meaningful to the engine and is discarded.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum EndpointRepr {
    Id(String),
    Port {
        step: String,
        #[serde(default)]
        #[allow(dead_code)]
        port: Option<serde_json::Value>,
    },
}

pub(super) fn deserialize_endpoint<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match EndpointRepr::deserialize(deserializer)? {
        EndpointRepr::Id(id) => id,
        EndpointRepr::Port { step, .. } => step,
    })
}
