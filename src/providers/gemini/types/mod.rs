//! Gemini wire types
//!
//! - content.rs: contents, parts, candidates and safety enums
//! - generation.rs: request/response envelopes and generation config
//! - config.rs: client configuration

mod config;
mod content;
mod generation;

pub use config::*;
pub use content::*;
pub use generation::*;
