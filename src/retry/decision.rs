use std::time::Duration;

/// Outcome of classifying one caught error.
///
/// Computed per error and consumed immediately by a retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryDecision {
    /// Whether a retry is warranted at all
    pub retryable: bool,
    /// Server-suggested wait before the next attempt
    pub suggested_delay: Option<Duration>,
}

impl RetryDecision {
    /// Do not retry; the error propagates unchanged.
    pub const fn no_retry() -> Self {
        Self {
            retryable: false,
            suggested_delay: None,
        }
    }

    /// Retry, with the caller choosing its own backoff.
    pub const fn retry() -> Self {
        Self {
            retryable: true,
            suggested_delay: None,
        }
    }

    /// Retry after the given delay.
    pub const fn retry_after(delay: Duration) -> Self {
        Self {
            retryable: true,
            suggested_delay: Some(delay),
        }
    }

    /// Delay to wait before the next attempt: the suggested delay when
    /// present, otherwise `fallback`.
    pub fn delay_or(&self, fallback: Duration) -> Duration {
        self.suggested_delay.unwrap_or(fallback)
    }
}
