//! Tool calling and function definition types

use serde::{Deserialize, Serialize};

/// A tool call reported by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier. Gemini matches results by function name, so this is
    /// the backend-supplied id when present and the function name otherwise.
    pub id: String,
    /// Function name
    pub function: String,
    /// Parsed arguments (always a JSON value, `{}` when the backend sent none)
    pub arguments: serde_json::Value,
    /// Tool type (always "function" for Gemini)
    pub r#type: String,
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        function: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            function: function.into(),
            arguments,
            r#type: "function".to_string(),
        }
    }
}

/// Tool definition offered to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Function name
    pub name: String,
    /// Function description
    pub description: String,
    /// JSON schema for function parameters (`None` for parameterless tools)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

impl ToolInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: None,
        }
    }

    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// Tool choice strategy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    /// Let the model decide whether to call tools (default)
    #[default]
    Auto,
    /// Require the model to call at least one tool
    Any,
    /// Prevent the model from calling any tools
    None,
    /// Force the model to call the named function
    Function(String),
}
