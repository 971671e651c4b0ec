//! Model capability trait

use async_trait::async_trait;

use crate::error::LlmError;
use crate::retry::{RetryDecision, default_classifier};
use crate::types::{ChatMessage, GenerateConfig, ModelOutput, ToolChoice, ToolInfo};

/// A provider adapter as seen by the generic model layer.
///
/// Implementations translate the request, call the backend once and
/// normalize the response. Retrying is the caller's job; `retry_decision`
/// tells it whether (and after how long) a failure is worth another attempt.
#[async_trait]
pub trait ModelApi: Send + Sync {
    /// Provider identifier, e.g. "gemini"
    fn provider_name(&self) -> &'static str;

    fn model_name(&self) -> &str;

    async fn generate(
        &self,
        input: &[ChatMessage],
        tools: &[ToolInfo],
        tool_choice: Option<&ToolChoice>,
        config: &GenerateConfig,
    ) -> Result<ModelOutput, LlmError>;

    /// Classify a failure from [`ModelApi::generate`].
    ///
    /// The default only looks at the status code.
    fn retry_decision(&self, error: &LlmError) -> RetryDecision {
        default_classifier(error)
    }

    fn should_retry(&self, error: &LlmError) -> bool {
        self.retry_decision(error).retryable
    }
}
