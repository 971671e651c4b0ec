use thiserror::Error;

/// Errors raised by the adapter and its transport collaborator.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// Transport-level failure that is neither a timeout nor a connect error
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Request exceeded the configured timeout
    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// Could not reach the backend
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Backend answered with a non-success status.
    ///
    /// `details` holds the decoded error envelope when the body was JSON.
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Rate limit error: {0}")]
    RateLimitError(String),

    /// Caller configuration could not be translated (unknown safety category,
    /// unknown threshold, conflicting entries).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    RateLimit,
    Client,
    Server,
    Parsing,
    Configuration,
    Internal,
}

impl LlmError {
    /// Create an `ApiError` without details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create an `ApiError` carrying structured details.
    pub fn api_error_with_details(
        code: u16,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    /// HTTP status associated with this error, if any.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            Self::AuthenticationError(_) => Some(401),
            Self::RateLimitError(_) => Some(429),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) | Self::TimeoutError(_) | Self::ConnectionError(_) => {
                ErrorCategory::Network
            }
            Self::AuthenticationError(_) | Self::MissingApiKey(_) => ErrorCategory::Authentication,
            Self::RateLimitError(_) => ErrorCategory::RateLimit,
            Self::ApiError { code, .. } => match *code {
                429 => ErrorCategory::RateLimit,
                401 | 403 => ErrorCategory::Authentication,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Client,
            },
            Self::JsonError(_) | Self::ParseError(_) => ErrorCategory::Parsing,
            Self::ConfigurationError(_) | Self::InvalidParameter(_) => {
                ErrorCategory::Configuration
            }
            Self::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// Status-only retryability.
    ///
    /// Backend-aware classification (suggested delays) lives in
    /// [`crate::providers::gemini::errors::retry_decision_for_error`].
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::ApiError { code, .. } => *code == 429 || (*code >= 500 && *code <= 599),
            Self::RateLimitError(_) | Self::TimeoutError(_) | Self::ConnectionError(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        assert!(LlmError::api_error(500, "boom").is_retryable());
        assert!(LlmError::api_error(503, "unavailable").is_retryable());
        assert!(LlmError::api_error(429, "slow down").is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!LlmError::api_error(400, "bad").is_retryable());
        assert!(!LlmError::api_error(401, "nope").is_retryable());
        assert!(!LlmError::ConfigurationError("unknown category".into()).is_retryable());
    }

    #[test]
    fn categories_follow_status() {
        assert_eq!(
            LlmError::api_error(429, "x").category(),
            ErrorCategory::RateLimit
        );
        assert_eq!(
            LlmError::api_error(403, "x").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            LlmError::api_error(502, "x").category(),
            ErrorCategory::Server
        );
        assert_eq!(
            LlmError::ConfigurationError("x".into()).category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn display_includes_code() {
        let err = LlmError::api_error(429, "quota");
        assert_eq!(err.to_string(), "API error 429: quota");
        assert_eq!(err.status_code(), Some(429));
    }
}
