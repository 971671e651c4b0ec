//! Normalized model output

use serde::{Deserialize, Serialize};

use super::ToolCall;

/// Why generation ended, in the framework's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of the completion
    Stop,
    /// Token limit reached
    Length,
    /// The model handed control to one or more tools
    ToolCalls,
    /// Output (or prompt) was blocked by a safety filter
    ContentFilter,
    /// Could not be determined, including malformed completions
    Unknown,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ToolCalls => "tool_calls",
            Self::ContentFilter => "content_filter",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One normalized completion alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionChoice {
    /// Position of the candidate in the backend response
    pub index: usize,
    /// Concatenated text; empty (never absent) when the backend sent none
    pub content: String,
    /// Concatenated thought summaries, kept apart from `content`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub stop_reason: StopReason,
    /// `None` when no calls were reported; never an empty vector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// Token usage copied from the backend's usage metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens_cache_read: Option<u32>,
}

/// Normalized result of one generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub model: String,
    /// Choices in backend candidate order
    pub choices: Vec<CompletionChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ModelUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

impl ModelOutput {
    /// Text of the first choice, or an empty string when there is none.
    pub fn completion(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.content.as_str())
            .unwrap_or_default()
    }

    /// Stop reason of the first choice.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.choices.first().map(|c| c.stop_reason)
    }
}
