//! Backoff crate-based retries
//!
//! Wraps `backoff::future::retry_notify`. Classifier decisions map onto the
//! backoff error model: non-retryable -> `permanent`, retryable with a
//! suggested delay -> `retry_after`, otherwise `transient`.
//!
//! `retry_after` skips the schedule's own elapsed-time check, so the
//! executor enforces `max_elapsed_time` itself: a retry whose wait would end
//! past the budget becomes `permanent`.

use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

use super::policy::millis;
use super::{RetryDecision, default_classifier};
use crate::error::LlmError;

/// Retry executor driven by an [`ExponentialBackoff`] schedule.
#[derive(Debug, Clone)]
pub struct BackoffRetryExecutor {
    backoff: ExponentialBackoff,
}

impl Default for BackoffRetryExecutor {
    fn default() -> Self {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(1000))
            .with_max_interval(Duration::from_secs(30))
            .with_multiplier(2.0)
            .with_max_elapsed_time(Some(Duration::from_secs(120)))
            .build();
        Self { backoff }
    }
}

impl BackoffRetryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_backoff(backoff: ExponentialBackoff) -> Self {
        Self { backoff }
    }

    /// Execute with status-only retry classification
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, LlmError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, LlmError>>,
    {
        self.execute_with_classifier(operation, default_classifier)
            .await
    }

    /// Execute, mapping each failure through `classifier`.
    pub async fn execute_with_classifier<F, Fut, T, C>(
        &self,
        operation: F,
        classifier: C,
    ) -> Result<T, LlmError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, LlmError>>,
        C: Fn(&LlmError) -> RetryDecision,
    {
        let mut schedule = self.backoff.clone();
        backoff::backoff::Backoff::reset(&mut schedule);

        // tokio's clock, so paused-time tests see the budget run out
        let started = tokio::time::Instant::now();
        let budget = self.backoff.max_elapsed_time;

        backoff::future::retry_notify(
            schedule,
            || {
                let attempt = operation();
                let classifier = &classifier;
                async move {
                    attempt.await.map_err(|error| {
                        let decision = classifier(&error);
                        let wait = decision.suggested_delay.unwrap_or_default();
                        if decision.retryable
                            && budget.is_some_and(|limit| {
                                started
                                    .elapsed()
                                    .checked_add(wait)
                                    .is_none_or(|end| end > limit)
                            })
                        {
                            tracing::debug!(
                                elapsed_ms = millis(started.elapsed()),
                                "retry budget exhausted: {error}"
                            );
                            return backoff::Error::permanent(error);
                        }
                        match decision {
                            RetryDecision {
                                retryable: false, ..
                            } => backoff::Error::permanent(error),
                            RetryDecision {
                                suggested_delay: Some(delay),
                                ..
                            } => backoff::Error::retry_after(error, delay),
                            _ => backoff::Error::transient(error),
                        }
                    })
                }
            },
            |error: LlmError, wait: Duration| {
                tracing::debug!(
                    delay_ms = millis(wait),
                    "retrying after error: {error}"
                );
            },
        )
        .await
    }
}

/// Retry with the default backoff schedule and status-only classification.
pub async fn retry_with_backoff<F, Fut, T>(operation: F) -> Result<T, LlmError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, LlmError>>,
{
    BackoffRetryExecutor::default().execute(operation).await
}
