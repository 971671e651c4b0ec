//! # genai-adapter
//!
//! Adapter between a generic language-model abstraction ([`traits::ModelApi`])
//! and the Google Gemini `generateContent` API.
//!
//! The interesting work happens in three pure components:
//!
//! - [`providers::gemini::safety`] translates caller safety settings
//!   (`{"hate_speech": "low"}`) into the full `safetySettings` list the
//!   backend expects, defaulting every unnamed category to `BLOCK_NONE`.
//! - [`providers::gemini::convert`] normalizes response candidates, including
//!   partial and malformed ones, into [`types::CompletionChoice`] values.
//! - [`providers::gemini::errors`] classifies backend failures into a
//!   [`retry::RetryDecision`], extracting the server-suggested delay from
//!   `google.rpc.RetryInfo` details.
//!
//! [`providers::gemini::GeminiClient`] wires them into a request lifecycle.
//! Retrying is left to the caller; [`retry_api`] offers ready-made loops that
//! honor the suggested delay.
//!
//! ```rust,no_run
//! use genai_adapter::prelude::*;
//!
//! # async fn example() -> Result<(), LlmError> {
//! let config = GeminiConfig::from_env()?
//!     .with_model("gemini-2.0-flash")
//!     .with_safety_setting("dangerous_content", "medium_and_above")
//!     .with_safety_setting("hate_speech", "low_and_above");
//! let client = GeminiClient::new(config)?;
//!
//! let input = [ChatMessage::user("What is 1 + 1?")];
//! let generate_config = GenerateConfig::default();
//! let output = retry_with(
//!     || client.generate(&input, &[], None, &generate_config),
//!     client.default_retry_options(),
//!     |err| client.retry_decision(err),
//! )
//! .await?;
//! println!("{}", output.completion());
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]

pub mod error;
pub mod providers;
pub mod retry;
pub mod retry_api;
pub mod telemetry;
pub mod traits;
pub mod types;

pub use error::{ErrorCategory, LlmError};

/// Commonly used items.
pub mod prelude {
    pub use crate::error::{ErrorCategory, LlmError};
    pub use crate::providers::gemini::{GeminiClient, GeminiConfig};
    pub use crate::retry::RetryDecision;
    pub use crate::retry_api::{RetryOptions, maybe_retry, retry_with};
    pub use crate::traits::ModelApi;
    pub use crate::types::{
        ChatMessage, CompletionChoice, GenerateConfig, ModelOutput, ModelUsage, StopReason,
        ToolCall, ToolChoice, ToolInfo,
    };
}
