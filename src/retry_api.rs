//! Public Retry API Facade
//!
//! The adapter never retries on its own: it classifies errors and leaves the
//! loop to the caller. This module is that loop, ready-made.
//!
//! - Simple defaults: `RetryOptions::default()` uses the backoff-based executor
//! - Opt-in control: `RetryOptions::policy_default()` selects the policy executor
//! - Classification comes from the caller, typically `GeminiClient::retry_decision`
//!
//! ```rust,no_run
//! use genai_adapter::prelude::*;
//!
//! # async fn example(client: GeminiClient) -> Result<(), LlmError> {
//! let input = [ChatMessage::user("hello")];
//! let config = GenerateConfig::default();
//! let options = RetryOptions::policy_default().with_max_attempts(5);
//! let output = retry_with(
//!     || client.generate(&input, &[], None, &config),
//!     options,
//!     |err| client.retry_decision(err),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::error::LlmError;
use crate::retry::RetryDecision;

pub use crate::retry::{BackoffRetryExecutor, RetryPolicy};

/// Retry backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryBackend {
    /// Backoff crate-based executor (recommended default)
    #[default]
    Backoff,
    /// Simple policy-based executor
    Policy,
}

/// Unified retry options
#[derive(Debug, Clone, Default)]
pub struct RetryOptions {
    pub backend: RetryBackend,
    /// Optional backoff executor override (Backoff backend only)
    pub backoff_executor: Option<BackoffRetryExecutor>,
    /// Policy-based options
    pub policy: Option<RetryPolicy>,
}

impl RetryOptions {
    /// Use default backoff backend
    pub fn backoff() -> Self {
        Self::default()
    }

    /// Use backoff backend with a custom executor.
    pub fn with_backoff_executor(mut self, executor: BackoffRetryExecutor) -> Self {
        self.backoff_executor = Some(executor);
        self
    }

    /// Use policy-based backend with default policy
    pub fn policy_default() -> Self {
        Self {
            backend: RetryBackend::Policy,
            policy: Some(RetryPolicy::default()),
            ..Default::default()
        }
    }

    /// Use policy-based backend with the given policy
    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self {
            backend: RetryBackend::Policy,
            policy: Some(policy),
            ..Default::default()
        }
    }

    /// Set max attempts for policy backend
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        if let Some(policy) = self.policy.take() {
            self.policy = Some(policy.with_max_attempts(attempts));
        }
        self
    }
}

/// Retry `operation` using `options`, asking `classifier` about every failure.
pub async fn retry_with<F, Fut, T, C>(
    operation: F,
    options: RetryOptions,
    classifier: C,
) -> Result<T, LlmError>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<T, LlmError>> + Send,
    T: Send,
    C: Fn(&LlmError) -> RetryDecision + Send + Sync,
{
    match options.backend {
        RetryBackend::Backoff => {
            let executor = options.backoff_executor.unwrap_or_default();
            executor.execute_with_classifier(operation, classifier).await
        }
        RetryBackend::Policy => {
            let policy = options.policy.unwrap_or_default();
            let executor = crate::retry::RetryExecutor::new(policy);
            executor.execute_with_classifier(operation, classifier).await
        }
    }
}

/// Retry only when options are provided.
///
/// Keeps call sites uniform when retry is optional (per-client or
/// per-request policy injection).
pub async fn maybe_retry<F, Fut, T, C>(
    options: Option<RetryOptions>,
    operation: F,
    classifier: C,
) -> Result<T, LlmError>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<T, LlmError>> + Send,
    T: Send,
    C: Fn(&LlmError) -> RetryDecision + Send + Sync,
{
    if let Some(opts) = options {
        retry_with(operation, opts, classifier).await
    } else {
        operation().await
    }
}
