use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The normalized outcome of executing a tool through the registry.
///
/// Successful results carry `result`; failed results carry `error` and, when
/// the failure came from the tool itself, the tool name and the arguments it
/// was called with. Build values through the constructors so the two halves
/// never mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecutionResult {
    /// Whether the tool ran to completion
    pub success: bool,
    /// The value returned by the tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The tool that failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// The arguments the failing tool received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
}

impl ToolExecutionResult {
    /// Creates a successful result.
    pub fn ok(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            tool: None,
            parameters: None,
        }
    }

    /// Creates a bare failure with only a message.
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            tool: None,
            parameters: None,
        }
    }

    /// Creates a failure raised by a tool while handling `parameters`.
    pub fn failure(
        tool: impl Into<String>,
        error: impl Into<String>,
        parameters: Map<String, Value>,
    ) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            tool: Some(tool.into()),
            parameters: Some(parameters),
        }
    }

    /// Serializes the result into the text fed back to the model.
    pub fn to_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({
                "success": false,
                "error": format!("Failed to serialize tool result: {}", e),
            })
            .to_string()
        })
    }
}
