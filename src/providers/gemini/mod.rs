//! Google Gemini provider
//!
//! - safety.rs: caller safety settings -> full `safetySettings` list
//! - convert.rs: request construction and candidate normalization
//! - errors.rs: error envelope decoding and retry classification
//! - client.rs: `GeminiClient`, the request lifecycle

pub mod client;
pub mod convert;
pub mod errors;
pub mod safety;
pub mod types;

pub use client::{GeminiClient, gemini_backoff_executor};
pub use errors::{classify_gemini_error, classify_gemini_http_error, retry_decision_for_error};
pub use safety::{DEFAULT_SAFETY_SETTINGS, map_safety_settings, parse_safety_settings_value};
pub use types::GeminiConfig;
