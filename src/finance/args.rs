use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::tool::ToolError;

/// A structured argument that normally arrives as a JSON-encoded string.
///
/// Models occasionally send the decoded value instead, so both are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Encoded<T> {
    Json(String),
    Inline(T),
}

impl<T: DeserializeOwned> Encoded<T> {
    /// Decodes the argument, naming `param` in the error.
    pub fn decode(self, param: &str) -> Result<T, String> {
        match self {
            Self::Json(raw) => serde_json::from_str(&raw)
                .map_err(|_| format!("Invalid JSON in {} parameter: {}", param, raw)),
            Self::Inline(value) => Ok(value),
        }
    }
}

/// Decodes the keyword arguments of a tool into its typed argument struct.
pub fn parse_args<T: DeserializeOwned>(args: Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))
}
