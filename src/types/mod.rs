//! Framework-facing types: chat input, tools, generation config, and the
//! normalized output every provider produces.

mod chat;
mod config;
mod output;
mod tools;

pub use chat::ChatMessage;
pub use config::GenerateConfig;
pub use output::{CompletionChoice, ModelOutput, ModelUsage, StopReason};
pub use tools::{ToolCall, ToolChoice, ToolInfo};
