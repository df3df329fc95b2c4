use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::tool::{DynTool, Tool, ToolDescriptor, ToolError, ToolExecutionResult, ToolSchema};
use crate::tool::schema::build_tool_schemas;

/// An immutable set of tools available to the agent.
///
/// Built once through [`ToolRegistryBuilder`], which validates every
/// descriptor and precomputes the schema sent to the model. The registry holds
/// no per-call state and can be shared between concurrent agent runs.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: IndexMap<String, DynTool>,
    schemas: IndexMap<String, ToolSchema>,
}

impl ToolRegistry {
    /// Starts building a new registry.
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// Gets a tool by name.
    pub fn get(&self, name: &str) -> Option<&DynTool> {
        self.tools.get(name)
    }

    /// Returns the registered tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns the descriptors of all registered tools.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|tool| tool.to_descriptor()).collect()
    }

    /// Returns the model-facing schema of every tool, keyed by name.
    pub fn schemas(&self) -> &IndexMap<String, ToolSchema> {
        &self.schemas
    }

    /// Returns the model-facing schemas as a list, ready for a request.
    pub fn tool_schemas(&self) -> Vec<ToolSchema> {
        self.schemas.values().cloned().collect()
    }

    /// Renders a human-readable listing of the tools and their parameters.
    pub fn describe(&self) -> String {
        self.tools
            .values()
            .map(|tool| {
                let mut desc = format!("**{}**: {}\nParameters:\n", tool.name(), tool.description());
                for param in tool.parameters() {
                    desc.push_str(&format!("  - {}: {}\n", param.name, param.description));
                }
                desc
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Executes a tool by name.
    ///
    /// Never fails: an unknown name, an error returned by the tool, or a panic
    /// inside it are all reported as an unsuccessful [`ToolExecutionResult`].
    pub async fn execute(&self, name: &str, arguments: &Map<String, Value>) -> ToolExecutionResult {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = name, "Tool not found");
            return ToolExecutionResult::error(format!(
                "Tool '{}' not found. Available tools: {:?}",
                name,
                self.names()
            ));
        };

        debug!(tool = name, "Executing tool");

        let outcome = AssertUnwindSafe(tool.execute(arguments.clone()))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => ToolExecutionResult::ok(result),
            Ok(Err(error)) => {
                debug!(tool = name, %error, "Tool failed");
                ToolExecutionResult::failure(name, error.to_string(), arguments.clone())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(tool = name, %message, "Tool panicked");
                ToolExecutionResult::failure(
                    name,
                    format!("Tool panicked: {}", message),
                    arguments.clone(),
                )
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl<'a> IntoIterator for &'a ToolRegistry {
    type Item = (&'a String, &'a DynTool);
    type IntoIter = indexmap::map::Iter<'a, String, DynTool>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.iter()
    }
}

/// Collects tools and validates them into a [`ToolRegistry`].
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<DynTool>,
}

impl ToolRegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool.
    pub fn register(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    /// Adds an already shared tool.
    pub fn register_shared(mut self, tool: DynTool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Validates the collected tools and freezes them into a registry.
    ///
    /// Fails on duplicate names or on descriptors that cannot be expressed as
    /// a function schema.
    pub fn build(self) -> Result<ToolRegistry, ToolError> {
        let descriptors: Vec<ToolDescriptor> =
            self.tools.iter().map(|tool| tool.to_descriptor()).collect();
        let schemas = build_tool_schemas(&descriptors)?;

        let tools = self
            .tools
            .into_iter()
            .map(|tool| (tool.name().to_string(), tool))
            .collect();

        Ok(ToolRegistry { tools, schemas })
    }
}

impl fmt::Debug for ToolRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistryBuilder")
            .field("tools_count", &self.tools.len())
            .finish()
    }
}
