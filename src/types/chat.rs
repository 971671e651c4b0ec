//! Chat message input types

use serde::{Deserialize, Serialize};

use super::ToolCall;

/// A message in the conversation sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
    },
    /// Result of a tool call, addressed to the function that produced it
    Tool {
        tool_call_id: String,
        function: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: None,
        }
    }

    pub fn tool(
        tool_call_id: impl Into<String>,
        function: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            function: function.into(),
            content: content.into(),
            error: None,
        }
    }

    /// Attach tool calls to an assistant message (no-op for other roles).
    pub fn with_tool_calls(mut self, calls: Vec<ToolCall>) -> Self {
        if let Self::Assistant { tool_calls, .. } = &mut self {
            *tool_calls = Some(calls);
        }
        self
    }

    /// Mark a tool message as failed (no-op for other roles).
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        if let Self::Tool { error, .. } = &mut self {
            *error = Some(message.into());
        }
        self
    }

    pub fn text(&self) -> &str {
        match self {
            Self::System { content }
            | Self::User { content }
            | Self::Assistant { content, .. }
            | Self::Tool { content, .. } => content,
        }
    }
}
