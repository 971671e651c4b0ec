//! Per-request generation parameters

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Generation parameters supplied by the caller for one request.
///
/// Every field is optional; unset fields are left out of the outgoing
/// request so the backend applies its own defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Sequences that end generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_seqs: Option<Vec<String>>,
    /// Number of candidates to request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_choices: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// JSON schema the response must follow (sets `application/json` output)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    /// Thinking budget for reasoning models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<i32>,
    /// Caller-facing safety settings (category name -> threshold name).
    ///
    /// When set, these replace the client-level settings for this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<BTreeMap<String, String>>,
}

impl GenerateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub const fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub const fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_stop_seqs(mut self, stop_seqs: Vec<String>) -> Self {
        self.stop_seqs = Some(stop_seqs);
        self
    }

    pub const fn with_num_choices(mut self, num_choices: u32) -> Self {
        self.num_choices = Some(num_choices);
        self
    }

    pub const fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub const fn with_reasoning_tokens(mut self, budget: i32) -> Self {
        self.reasoning_tokens = Some(budget);
        self
    }

    /// Add one caller-facing safety setting for this request.
    pub fn with_safety_setting(
        mut self,
        category: impl Into<String>,
        threshold: impl Into<String>,
    ) -> Self {
        self.safety_settings
            .get_or_insert_with(BTreeMap::new)
            .insert(category.into(), threshold.into());
        self
    }
}
