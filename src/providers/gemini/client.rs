//! Gemini Client Implementation
//!
//! One request lifecycle: map safety settings, build the request, POST
//! `models/{model}:generateContent`, normalize the candidates. Failures are
//! classified, never retried here.

use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use reqwest::Client as HttpClient;
use secrecy::ExposeSecret;

use crate::error::LlmError;
use crate::retry::{BackoffRetryExecutor, RetryDecision};
use crate::retry_api::RetryOptions;
use crate::traits::ModelApi;
use crate::types::{ChatMessage, GenerateConfig, ModelOutput, ToolChoice, ToolInfo};

use super::convert::{build_generate_request, model_output_from_response};
use super::errors::{classify_gemini_http_error, retry_decision_for_error};
use super::safety::map_safety_settings;
use super::types::{GeminiConfig, GenerateContentResponse, SafetySetting};

/// Backoff tuned for Gemini quota windows: slow growth, long ceiling.
pub fn gemini_backoff_executor() -> BackoffRetryExecutor {
    BackoffRetryExecutor::with_backoff(
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(1000))
            .with_max_interval(Duration::from_secs(60))
            .with_multiplier(1.5)
            .with_max_elapsed_time(Some(Duration::from_secs(300)))
            .build(),
    )
}

/// Gemini client implementing [`ModelApi`]
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    /// Gemini configuration
    config: GeminiConfig,
    /// HTTP client for making requests
    http_client: HttpClient,
}

impl GeminiClient {
    /// Create a new Gemini client with the given configuration
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| {
                LlmError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        Self::with_http_client(config, http_client)
    }

    /// Create a new Gemini client with a custom HTTP client
    pub fn with_http_client(config: GeminiConfig, http_client: HttpClient) -> Result<Self, LlmError> {
        if config.api_key.expose_secret().trim().is_empty() {
            return Err(LlmError::MissingApiKey(
                "Gemini API key is empty".to_string(),
            ));
        }
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Build a client from `GEMINI_API_KEY` / `GOOGLE_API_KEY`.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(GeminiConfig::from_env()?)
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Full `generateContent` URL for the configured model.
    pub fn generate_url(&self) -> String {
        let model = self
            .config
            .model
            .strip_prefix("models/")
            .unwrap_or(&self.config.model);
        format!("{}/models/{model}:generateContent", self.config.base_url())
    }

    /// Resolve the safety list for one request.
    ///
    /// Per-request settings replace the client-level ones entirely.
    pub fn safety_settings_for(
        &self,
        config: &GenerateConfig,
    ) -> Result<Vec<SafetySetting>, LlmError> {
        match &config.safety_settings {
            Some(settings) => map_safety_settings(settings),
            None => map_safety_settings(&self.config.safety_settings),
        }
    }

    /// Run one generation request.
    ///
    /// Safety mapping errors abort before any I/O. Non-success statuses come
    /// back as [`LlmError::ApiError`] carrying the decoded error envelope;
    /// pass them to [`Self::retry_decision`].
    #[tracing::instrument(
        name = "gemini.generate",
        skip_all,
        fields(model = %self.config.model, messages = input.len(), tools = tools.len())
    )]
    pub async fn generate(
        &self,
        input: &[ChatMessage],
        tools: &[ToolInfo],
        tool_choice: Option<&ToolChoice>,
        config: &GenerateConfig,
    ) -> Result<ModelOutput, LlmError> {
        let safety_settings = self.safety_settings_for(config)?;
        let request = build_generate_request(input, tools, tool_choice, config, safety_settings)?;
        let url = self.generate_url();

        tracing::debug!(url = %url, "dispatching generateContent");

        let mut builder = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .json(&request);
        for (name, value) in &self.config.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = classify_gemini_http_error(status.as_u16(), &body);
            tracing::debug!(status = status.as_u16(), "generateContent failed: {error}");
            return Err(error);
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::ParseError(format!("Invalid generateContent response: {e}"))
        })?;
        let output = model_output_from_response(&parsed, &self.config.model);

        tracing::debug!(
            candidates = output.choices.len(),
            stop_reason = ?output.stop_reason(),
            "generateContent succeeded"
        );
        Ok(output)
    }

    /// Classify a failure from [`Self::generate`].
    pub fn retry_decision(&self, error: &LlmError) -> RetryDecision {
        retry_decision_for_error(error)
    }

    pub fn should_retry(&self, error: &LlmError) -> bool {
        self.retry_decision(error).retryable
    }

    /// Retry options using [`gemini_backoff_executor`].
    pub fn default_retry_options(&self) -> RetryOptions {
        RetryOptions::backoff().with_backoff_executor(gemini_backoff_executor())
    }
}

#[async_trait]
impl ModelApi for GeminiClient {
    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(
        &self,
        input: &[ChatMessage],
        tools: &[ToolInfo],
        tool_choice: Option<&ToolChoice>,
        config: &GenerateConfig,
    ) -> Result<ModelOutput, LlmError> {
        GeminiClient::generate(self, input, tools, tool_choice, config).await
    }

    fn retry_decision(&self, error: &LlmError) -> RetryDecision {
        GeminiClient::retry_decision(self, error)
    }
}
