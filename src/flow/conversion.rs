use super::definition::Flow;
use crate::error::FlowConversionError;

/// A trait for custom data models that can be converted into a `Flow`.
///
/// This is the extension point for hosts whose editors persist graphs in their own
/// shape. Implement it on your document type and hand the result to
/// `FlowExecutor::execute`.
///
/// # Example
///
/// ```rust,no_run
/// use flowrunner::prelude::*;
/// use flowrunner::error::FlowConversionError;
///
/// struct MyNode { key: String, kind: String }
/// struct MyDocument { nodes: Vec<MyNode>, links: Vec<(String, String)> }
///
/// impl IntoFlow for MyDocument {
///     fn into_flow(self) -> std::result::Result<Flow, FlowConversionError> {
///         let steps = self.nodes.into_iter().map(|n| Step::new(n.key, n.kind)).collect();
///         let edges = self.links.into_iter().map(|(a, b)| Edge::new(a, b)).collect();
///         Ok(Flow::new(steps, edges))
///     }
/// }
/// ```
pub trait IntoFlow {
    /// Consumes the object and converts it into an executable flow.
    fn into_flow(self) -> Result<Flow, FlowConversionError>;
}

impl IntoFlow for Flow {
    fn into_flow(self) -> Result<Flow, FlowConversionError> {
        Ok(self)
    }
}

impl IntoFlow for serde_json::Value {
    fn into_flow(self) -> Result<Flow, FlowConversionError> {
        if !self.is_object() {
            return Err(FlowConversionError::Validation(
                "a flow document must be a JSON object".to_string(),
            ));
        }
        Ok(serde_json::from_value(self)?)
    }
}
