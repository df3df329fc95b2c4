pub mod registry;
pub mod result;
pub mod schema;

pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use result::ToolExecutionResult;
pub use schema::{ToolSchema, build_tool_schema, build_tool_schemas};
pub use tool_types::{ParamKind, ParamSpec, ToolDescriptor, ToolError};
pub use tool_trait::{DynTool, Tool};

mod tool_types {
    use serde::{Deserialize, Serialize};

    /// How a parameter's string value is meant to be read by the tool.
    ///
    /// Every parameter crosses the model boundary as a string; the kind only
    /// decides which encoding hint the model is given.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ParamKind {
        /// Plain text such as a file or column name
        Text,
        /// A JSON object or data payload encoded as a string
        Json,
        /// A JSON array of names encoded as a string
        JsonArray,
    }

    /// A single declared parameter of a tool.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ParamSpec {
        /// Argument name as the model must send it
        pub name: String,
        /// Human readable description shown to the model
        pub description: String,
        /// Encoding of the argument value
        pub kind: ParamKind,
    }

    impl ParamSpec {
        /// Creates a plain text parameter.
        pub fn text(name: impl Into<String>, description: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                description: description.into(),
                kind: ParamKind::Text,
            }
        }

        /// Creates a parameter carrying a JSON-encoded object or payload.
        pub fn json(name: impl Into<String>, description: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                description: description.into(),
                kind: ParamKind::Json,
            }
        }

        /// Creates a parameter carrying a JSON-encoded array.
        pub fn json_array(name: impl Into<String>, description: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                description: description.into(),
                kind: ParamKind::JsonArray,
            }
        }
    }

    /// Metadata describing a tool: its name, purpose and required parameters.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ToolDescriptor {
        /// The unique name of the tool
        pub name: String,
        /// A description of what the tool does
        pub description: String,
        /// Required parameters, in declaration order
        pub parameters: Vec<ParamSpec>,
    }

    /// Errors that can occur when building or executing tools.
    #[derive(Debug, thiserror::Error)]
    pub enum ToolError {
        #[error("Invalid arguments: {0}")]
        InvalidArguments(String),
        #[error("{0}")]
        ExecutionFailed(String),
        #[error("Invalid descriptor for tool '{tool}': {reason}")]
        InvalidDescriptor { tool: String, reason: String },
        #[error("Tool '{0}' is already registered")]
        DuplicateTool(String),
    }
}

mod tool_trait {
    use super::tool_types::{ParamSpec, ToolDescriptor, ToolError};
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use std::sync::Arc;

    /// Trait representing a tool that can be called by the agent.
    ///
    /// Implementations must not keep per-call mutable state: the same tool is
    /// shared by every agent run that uses its registry.
    #[async_trait]
    pub trait Tool: Send + Sync {
        /// Returns the name of the tool.
        fn name(&self) -> &str;
        /// Returns a description of what the tool does.
        fn description(&self) -> &str;
        /// Returns the required parameters of the tool.
        fn parameters(&self) -> Vec<ParamSpec>;

        /// Executes the tool with the given keyword arguments.
        async fn execute(&self, args: Map<String, Value>) -> Result<Value, ToolError>;

        /// Converts the tool to its descriptor.
        fn to_descriptor(&self) -> ToolDescriptor {
            ToolDescriptor {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.parameters(),
            }
        }
    }

    /// A type alias for a dynamic tool reference.
    pub type DynTool = Arc<dyn Tool>;
}
