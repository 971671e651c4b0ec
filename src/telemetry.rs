//! Tracing subscriber setup
//!
//! The adapter only emits `tracing` events; installing a subscriber is the
//! application's call. These helpers cover the common cases.
//!
//! ## Example
//!
//! ```rust,no_run
//! use genai_adapter::telemetry::{OutputFormat, SubscriberConfig, init_subscriber};
//!
//! # fn main() -> Result<(), genai_adapter::LlmError> {
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::error::LlmError;

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON, one object per line
    Json,
    /// Compact JSON format
    JsonCompact,
}

/// Configuration for tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to stdout when no log file is set
    pub enable_console: bool,
    /// Log file path; takes precedence over the console
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            enable_console: true,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// Create a debug configuration
    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Default::default()
        }
    }

    /// Create a production configuration
    pub fn production(log_file: PathBuf) -> Self {
        Self {
            log_level: tracing::Level::WARN,
            output_format: OutputFormat::Json,
            enable_console: false,
            log_file: Some(log_file),
        }
    }
}

/// Builder for SubscriberConfig
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    enable_console: Option<bool>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string
    pub fn log_level_str(mut self, level: &str) -> Result<Self, LlmError> {
        self.log_level = Some(parse_level(level)?);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Set the output format from a string (`text`, `json`, `json-compact`)
    pub fn output_format_str(mut self, format: &str) -> Result<Self, LlmError> {
        self.output_format = Some(parse_format(format)?);
        Ok(self)
    }

    pub fn enable_console(mut self, enable: bool) -> Self {
        self.enable_console = Some(enable);
        self
    }

    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            enable_console: self.enable_console.unwrap_or(true),
            log_file: self.log_file,
        }
    }
}

fn parse_level(level: &str) -> Result<tracing::Level, LlmError> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        _ => Err(LlmError::ConfigurationError(format!(
            "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
        ))),
    }
}

fn parse_format(format: &str) -> Result<OutputFormat, LlmError> {
    match format.trim().to_lowercase().as_str() {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        "json-compact" | "json_compact" => Ok(OutputFormat::JsonCompact),
        _ => Err(LlmError::ConfigurationError(format!(
            "Invalid log format: {format}. Valid options: text, json, json-compact"
        ))),
    }
}

fn try_init_with<W>(
    format: OutputFormat,
    filter: String,
    writer: W,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        OutputFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(true)
            .json()
            .try_init(),
        OutputFormat::JsonCompact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(true)
            .json()
            .flatten_event(true)
            .try_init(),
        OutputFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(true)
            .try_init(),
    }
}

/// Initialize tracing subscriber with the given configuration
///
/// Returns a guard when logging to a file; keep it alive for as long as logs
/// should be flushed. An already-installed global subscriber is not an
/// error.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, LlmError> {
    let level = config.log_level.as_str().to_lowercase();
    let filter = format!("genai_adapter={level}");

    let (init_result, guard) = match &config.log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path.file_name().ok_or_else(|| {
                LlmError::ConfigurationError(format!("Invalid log file path: {}", path.display()))
            })?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                try_init_with(config.output_format, filter, writer),
                Some(guard),
            )
        }
        None if config.enable_console => (
            try_init_with(config.output_format, filter, std::io::stdout),
            None,
        ),
        None => return Ok(None),
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) => {
            let error_msg = e.to_string();
            if error_msg.contains("global default trace dispatcher has already been set") {
                // Tracing is already initialized, which is fine
                Ok(None)
            } else {
                Err(LlmError::ConfigurationError(format!(
                    "Failed to initialize tracing: {e}"
                )))
            }
        }
    }
}

/// Initialize tracing subscriber with default configuration
pub fn init_default() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(SubscriberConfig::default())
}

/// Initialize tracing subscriber from environment variables
///
/// - `GENAI_ADAPTER_LOG_LEVEL`: trace, debug, info, warn, error
/// - `GENAI_ADAPTER_LOG_FORMAT`: text, json, json-compact
/// - `GENAI_ADAPTER_LOG_FILE`: log file path
pub fn init_from_env() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(config_from_lookup(|name| std::env::var(name).ok())?)
}

fn config_from_lookup<F>(lookup: F) -> Result<SubscriberConfig, LlmError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = SubscriberConfig::builder();

    if let Some(level) = lookup("GENAI_ADAPTER_LOG_LEVEL") {
        builder = builder.log_level_str(&level)?;
    }
    if let Some(format) = lookup("GENAI_ADAPTER_LOG_FORMAT") {
        builder = builder.output_format_str(&format)?;
    }
    if let Some(file_path) = lookup("GENAI_ADAPTER_LOG_FILE") {
        builder = builder.log_file(PathBuf::from(file_path));
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_lookup_builds_config() {
        let config = config_from_lookup(|name| match name {
            "GENAI_ADAPTER_LOG_LEVEL" => Some("DEBUG".to_string()),
            "GENAI_ADAPTER_LOG_FORMAT" => Some("json-compact".to_string()),
            "GENAI_ADAPTER_LOG_FILE" => Some("/tmp/genai-adapter.log".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.output_format, OutputFormat::JsonCompact);
        assert_eq!(
            config.log_file,
            Some(PathBuf::from("/tmp/genai-adapter.log"))
        );
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        let err = config_from_lookup(|name| {
            (name == "GENAI_ADAPTER_LOG_LEVEL").then(|| "loud".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));

        assert!(SubscriberConfig::builder().output_format_str("xml").is_err());
    }

    #[test]
    fn repeated_init_is_tolerated() {
        let _first = init_default();
        let second = init_subscriber(SubscriberConfig::debug());
        assert!(second.is_ok());
    }
}
