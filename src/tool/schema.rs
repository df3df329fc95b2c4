//! Translation of tool descriptors into the function-calling schema expected
//! by OpenAI-compatible chat completion APIs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{ParamKind, ToolDescriptor, ToolError};

const JSON_HINT: &str = " Provide as JSON string.";
const JSON_ARRAY_HINT: &str = " Provide as JSON array string.";

/// A function tool definition as sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Always `"function"`
    #[serde(rename = "type")]
    pub tool_type: String,
    /// The function being exposed
    pub function: FunctionSchema,
}

/// The function part of a [`ToolSchema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: ParametersSchema,
}

/// JSON Schema object describing the function arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: IndexMap<String, PropertySchema>,
    pub required: Vec<String>,
}

/// Schema of a single argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub description: String,
}

impl ToolSchema {
    /// Returns the name of the exposed function.
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Builds the schema for a single tool.
///
/// Every parameter is typed as a string and listed as required. Structured
/// parameters get a hint telling the model to encode them as JSON.
pub fn build_tool_schema(descriptor: &ToolDescriptor) -> Result<ToolSchema, ToolError> {
    let invalid = |reason: &str| ToolError::InvalidDescriptor {
        tool: descriptor.name.clone(),
        reason: reason.to_string(),
    };

    if descriptor.name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if descriptor.description.trim().is_empty() {
        return Err(invalid("description is empty"));
    }

    let mut properties = IndexMap::new();
    let mut required = Vec::with_capacity(descriptor.parameters.len());

    for param in &descriptor.parameters {
        if param.name.trim().is_empty() {
            return Err(invalid("parameter name is empty"));
        }
        if param.description.trim().is_empty() {
            return Err(invalid(&format!(
                "parameter '{}' has no description",
                param.name
            )));
        }

        let hint = match param.kind {
            ParamKind::Text => "",
            ParamKind::Json => JSON_HINT,
            ParamKind::JsonArray => JSON_ARRAY_HINT,
        };
        let property = PropertySchema {
            schema_type: "string".to_string(),
            description: format!("{}{}", param.description, hint),
        };

        if properties.insert(param.name.clone(), property).is_some() {
            return Err(invalid(&format!(
                "parameter '{}' is declared twice",
                param.name
            )));
        }
        required.push(param.name.clone());
    }

    Ok(ToolSchema {
        tool_type: "function".to_string(),
        function: FunctionSchema {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            parameters: ParametersSchema {
                schema_type: "object".to_string(),
                properties,
                required,
            },
        },
    })
}

/// Builds schemas for a set of tools, keyed by tool name in input order.
pub fn build_tool_schemas<'a>(
    descriptors: impl IntoIterator<Item = &'a ToolDescriptor>,
) -> Result<IndexMap<String, ToolSchema>, ToolError> {
    let mut schemas = IndexMap::new();
    for descriptor in descriptors {
        let schema = build_tool_schema(descriptor)?;
        if schemas.contains_key(&descriptor.name) {
            return Err(ToolError::DuplicateTool(descriptor.name.clone()));
        }
        schemas.insert(descriptor.name.clone(), schema);
    }
    Ok(schemas)
}
