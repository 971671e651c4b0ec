use std::collections::{BTreeMap, HashMap};

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::error::LlmError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Gemini client configuration
///
/// Deserializable from a config file; the API key is never serialized and
/// never printed by `Debug`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key for authentication (securely stored)
    #[serde(deserialize_with = "deserialize_api_key")]
    pub api_key: SecretString,
    /// Base URL for the Gemini API
    pub base_url: String,
    /// Default model to use
    pub model: String,
    /// HTTP timeout in seconds
    pub timeout: u64,
    /// Client-level safety settings (category name -> threshold name).
    /// Per-request settings in `GenerateConfig` take precedence.
    pub safety_settings: BTreeMap<String, String>,
    /// Extra HTTP headers sent with every request
    pub headers: HashMap<String, String>,
}

fn deserialize_api_key<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use secrecy::ExposeSecret;
        f.debug_struct("GeminiConfig")
            .field(
                "api_key_present",
                &(!self.api_key.expose_secret().is_empty()),
            )
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("safety_settings", &self.safety_settings)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: SecretString::from(String::new()),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            safety_settings: BTreeMap::new(),
            headers: HashMap::new(),
        }
    }
}

impl GeminiConfig {
    /// Create a new Gemini configuration with the given API key
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            ..Default::default()
        }
    }

    /// Build from the environment.
    ///
    /// Reads `GEMINI_API_KEY` (falling back to `GOOGLE_API_KEY`) and,
    /// optionally, `GEMINI_BASE_URL` / `GOOGLE_BASE_URL`.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("GEMINI_API_KEY")
            .or_else(|| non_empty("GOOGLE_API_KEY"))
            .ok_or(LlmError::MissingApiKey(
                "set GEMINI_API_KEY or GOOGLE_API_KEY".to_string(),
            ))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = non_empty("GEMINI_BASE_URL").or_else(|| non_empty("GOOGLE_BASE_URL"))
        {
            config.base_url = base_url;
        }
        Ok(config)
    }

    /// Set the API key
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = SecretString::from(api_key.into());
        self
    }
    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
    /// Set HTTP timeout in seconds
    pub const fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }
    /// Add a single safety setting, e.g. `("hate_speech", "low_and_above")`
    pub fn with_safety_setting(
        mut self,
        category: impl Into<String>,
        threshold: impl Into<String>,
    ) -> Self {
        self.safety_settings
            .insert(category.into(), threshold.into());
        self
    }
    /// Replace all safety settings
    pub fn with_safety_settings(mut self, settings: BTreeMap<String, String>) -> Self {
        self.safety_settings = settings;
        self
    }
    /// Add an HTTP header sent with every request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Trimmed base URL (no trailing slash)
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
