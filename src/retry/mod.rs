//! Retry module (ergonomic namespace)
//! - decision.rs: per-error retry decision
//! - policy.rs: generic policy-based retries
//! - backoff.rs: backoff crate-based retries

pub mod backoff;
mod decision;
pub mod policy;

pub use self::backoff::{BackoffRetryExecutor, retry_with_backoff};
pub use self::decision::RetryDecision;
pub use self::policy::{RetryExecutor, RetryPolicy, default_classifier, retry_with_default};
