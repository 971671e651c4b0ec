//! Gemini error classification
//!
//! Google APIs report failures as
//! `{"error": {"code", "message", "status", "details": [{"@type": ...}]}}`.
//! This module decodes that envelope and turns it into a [`RetryDecision`]:
//! only 429 and 5xx are retried, and a `google.rpc.RetryInfo` detail supplies
//! the wait the server asks for.
//!
//! Classification is stateless. Counting attempts and sleeping belong to the
//! retry loop (see [`crate::retry_api`]).

use std::collections::BTreeMap;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::LlmError;
use crate::retry::RetryDecision;
use crate::retry::policy::millis;

/// Top-level error body.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorEnvelope {
    pub error: GoogleError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    /// Canonical status, e.g. `RESOURCE_EXHAUSTED`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub details: Vec<ErrorDetail>,
}

/// A `details` entry, decoded by its `@type`.
///
/// Unknown types, and known types whose payload does not decode, are kept as
/// `Unrecognized` with the raw payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetail {
    QuotaFailure(QuotaFailure),
    RetryInfo(RetryInfo),
    Help(Help),
    ErrorInfo(ErrorInfo),
    BadRequest(BadRequest),
    Unrecognized { type_url: String, payload: Value },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuotaFailure {
    #[serde(default)]
    pub violations: Vec<QuotaViolation>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaViolation {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quota_metric: Option<String>,
    #[serde(default)]
    pub quota_id: Option<String>,
    #[serde(default)]
    pub quota_dimensions: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub quota_value: Option<Value>,
}

/// `retryDelay` is normally a duration string (`"42s"`); the object form
/// `{"seconds": 42, "nanos": 0}` is accepted too.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryInfo {
    #[serde(default)]
    pub retry_delay: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Help {
    #[serde(default)]
    pub links: Vec<HelpLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HelpLink {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorInfo {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadRequest {
    #[serde(default)]
    pub field_violations: Vec<FieldViolation>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldViolation {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ErrorDetail {
    /// Decode one detail record from its JSON payload.
    pub fn from_value(payload: Value) -> Self {
        fn decode<T: DeserializeOwned>(payload: &Value) -> Option<T> {
            serde_json::from_value(payload.clone()).ok()
        }

        let type_url = payload
            .get("@type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        // "type.googleapis.com/google.rpc.RetryInfo" -> "google.rpc.RetryInfo"
        let kind = type_url.rsplit('/').next().unwrap_or_default();

        let decoded = match kind {
            "google.rpc.QuotaFailure" => decode(&payload).map(Self::QuotaFailure),
            "google.rpc.RetryInfo" => decode(&payload).map(Self::RetryInfo),
            "google.rpc.Help" => decode(&payload).map(Self::Help),
            "google.rpc.ErrorInfo" => decode(&payload).map(Self::ErrorInfo),
            "google.rpc.BadRequest" => decode(&payload).map(Self::BadRequest),
            _ => None,
        };

        decoded.unwrap_or(Self::Unrecognized { type_url, payload })
    }
}

impl<'de> Deserialize<'de> for ErrorDetail {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

impl GoogleErrorEnvelope {
    /// The first `RetryInfo` detail, wherever it sits in the list.
    pub fn retry_info(&self) -> Option<&RetryInfo> {
        self.error.details.iter().find_map(|detail| match detail {
            ErrorDetail::RetryInfo(info) => Some(info),
            _ => None,
        })
    }
}

lazy_static! {
    static ref DURATION_RE: Regex =
        Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(ms|s|m|h)\s*$").expect("valid duration regex");
}

/// Parse a duration such as `"42s"`, `"1.5s"`, `"250ms"`, `"2m"` or `"1h"`.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let captures = DURATION_RE.captures(text)?;
    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    let seconds = match captures.get(2)?.as_str() {
        "ms" => value / 1000.0,
        "s" => value,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        _ => return None,
    };
    Duration::try_from_secs_f64(seconds).ok()
}

const NANOS_PER_SECOND: u64 = 1_000_000_000;

fn parse_retry_delay(delay: &Value) -> Option<Duration> {
    match delay {
        Value::String(text) => parse_duration(text),
        Value::Object(fields) => {
            let seconds = fields.get("seconds").and_then(|v| match v {
                Value::String(s) => s.parse::<u64>().ok(),
                other => other.as_u64(),
            });
            let nanos = match fields.get("nanos") {
                Some(value) => value.as_u64().filter(|n| *n < NANOS_PER_SECOND)?,
                None => 0,
            };
            Duration::from_secs(seconds?).checked_add(Duration::from_nanos(nanos))
        }
        _ => None,
    }
}

/// Whether a status is worth retrying at all.
pub const fn is_retryable_status(status: u16) -> bool {
    status == 429 || (status >= 500 && status <= 599)
}

/// Classify a backend failure.
///
/// Non-candidates (anything but 429 and 5xx) are never retried, whatever
/// their details say. For candidates the `RetryInfo` delay, when present and
/// parseable, becomes the suggested wait.
pub fn classify_gemini_error(
    status: u16,
    envelope: Option<&GoogleErrorEnvelope>,
) -> RetryDecision {
    if !is_retryable_status(status) {
        return RetryDecision::no_retry();
    }

    let Some(delay) = envelope
        .and_then(GoogleErrorEnvelope::retry_info)
        .and_then(|info| info.retry_delay.as_ref())
    else {
        return RetryDecision::retry();
    };

    match parse_retry_delay(delay) {
        Some(wait) => RetryDecision::retry_after(wait),
        None => {
            tracing::warn!(status, retry_delay = %delay, "unparseable retryDelay, retrying without a suggested delay");
            RetryDecision::retry()
        }
    }
}

const RAW_BODY_SAMPLE: usize = 512;

/// Turn a failed HTTP response into an [`LlmError::ApiError`].
///
/// The decoded body is kept in `details` so the error can be classified
/// later by [`retry_decision_for_error`].
pub fn classify_gemini_http_error(status: u16, body: &str) -> LlmError {
    let json: Option<Value> = serde_json::from_str(body).ok();
    let envelope = json
        .as_ref()
        .and_then(|v| serde_json::from_value::<GoogleErrorEnvelope>(v.clone()).ok());

    match (json, envelope) {
        (Some(details), Some(envelope)) => {
            let message = match (&envelope.error.status, envelope.error.message.is_empty()) {
                (Some(code), false) => format!("{code}: {}", envelope.error.message),
                (Some(code), true) => code.clone(),
                (None, false) => envelope.error.message.clone(),
                (None, true) => format!("HTTP {status}"),
            };
            LlmError::api_error_with_details(status, message, details)
        }
        (Some(details), None) => {
            LlmError::api_error_with_details(status, format!("HTTP {status}"), details)
        }
        (None, _) => {
            let sample: String = body.chars().take(RAW_BODY_SAMPLE).collect();
            let message = if sample.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                sample
            };
            LlmError::api_error(status, message)
        }
    }
}

/// Classify any crate error.
///
/// API errors go through [`classify_gemini_error`]; timeouts, connection
/// failures and rate limits are retried without a delay; everything else is
/// final.
pub fn retry_decision_for_error(error: &LlmError) -> RetryDecision {
    let decision = match error {
        LlmError::ApiError { code, details, .. } => {
            let envelope = details
                .as_ref()
                .and_then(|d| serde_json::from_value::<GoogleErrorEnvelope>(d.clone()).ok());
            classify_gemini_error(*code, envelope.as_ref())
        }
        LlmError::TimeoutError(_) | LlmError::ConnectionError(_) | LlmError::RateLimitError(_) => {
            RetryDecision::retry()
        }
        _ => RetryDecision::no_retry(),
    };

    tracing::debug!(
        retryable = decision.retryable,
        suggested_delay_ms = decision.suggested_delay.map(millis),
        "classified error: {error}"
    );
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    fn quota_envelope(delay: Value) -> Value {
        json!({
            "error": {
                "code": 429,
                "message": "Resource has been exhausted (e.g. check quota).",
                "status": "RESOURCE_EXHAUSTED",
                "details": [
                    {
                        "@type": "type.googleapis.com/google.rpc.QuotaFailure",
                        "violations": [{
                            "quotaMetric": "generativelanguage.googleapis.com/generate_content_free_tier_requests",
                            "quotaId": "GenerateRequestsPerMinutePerProjectPerModel-FreeTier",
                            "quotaDimensions": {"model": "gemini-2.0-flash", "location": "global"},
                            "quotaValue": "15"
                        }]
                    },
                    {
                        "@type": "type.googleapis.com/google.rpc.Help",
                        "links": [{
                            "description": "Learn more about Gemini API quotas",
                            "url": "https://ai.google.dev/gemini-api/docs/rate-limits"
                        }]
                    },
                    {
                        "@type": "type.googleapis.com/google.rpc.RetryInfo",
                        "retryDelay": delay
                    }
                ]
            }
        })
    }

    #[test]
    fn quota_failure_with_retry_info_suggests_delay() {
        let body = quota_envelope(json!("42s")).to_string();
        let err = classify_gemini_http_error(429, &body);
        assert!(matches!(err, LlmError::ApiError { code: 429, .. }));
        assert!(err.to_string().contains("RESOURCE_EXHAUSTED"));

        let decision = retry_decision_for_error(&err);
        assert_eq!(decision, RetryDecision::retry_after(Duration::from_secs(42)));
    }

    #[test]
    fn details_decode_by_type() {
        let envelope: GoogleErrorEnvelope =
            serde_json::from_value(quota_envelope(json!("42s"))).unwrap();
        let details = &envelope.error.details;
        assert_eq!(details.len(), 3);
        assert!(matches!(&details[0], ErrorDetail::QuotaFailure(q) if q.violations.len() == 1));
        assert!(matches!(&details[1], ErrorDetail::Help(h) if h.links.len() == 1));
        assert!(matches!(&details[2], ErrorDetail::RetryInfo(_)));
    }

    #[test]
    fn unknown_detail_types_are_kept() {
        let envelope: GoogleErrorEnvelope = serde_json::from_value(json!({
            "error": {
                "code": 503,
                "message": "overloaded",
                "details": [
                    {"@type": "type.googleapis.com/google.rpc.DebugInfo", "detail": "x"},
                    {"no_type": true}
                ]
            }
        }))
        .unwrap();
        match &envelope.error.details[0] {
            ErrorDetail::Unrecognized { type_url, payload } => {
                assert_eq!(type_url, "type.googleapis.com/google.rpc.DebugInfo");
                assert_eq!(payload["detail"], "x");
            }
            other => panic!("unexpected detail: {other:?}"),
        }
        assert!(matches!(
            &envelope.error.details[1],
            ErrorDetail::Unrecognized { type_url, .. } if type_url.is_empty()
        ));
        assert_eq!(
            classify_gemini_error(503, Some(&envelope)),
            RetryDecision::retry()
        );
    }

    #[test]
    fn bad_request_is_never_retried() {
        // Even with a retry-info detail attached
        let body = json!({
            "error": {
                "code": 400,
                "message": "Invalid JSON payload received.",
                "status": "INVALID_ARGUMENT",
                "details": [
                    {
                        "@type": "type.googleapis.com/google.rpc.BadRequest",
                        "fieldViolations": [{"field": "contents", "description": "required"}]
                    },
                    {"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "1s"}
                ]
            }
        })
        .to_string();
        let err = classify_gemini_http_error(400, &body);
        assert_eq!(retry_decision_for_error(&err), RetryDecision::no_retry());
    }

    #[test]
    fn server_errors_without_retry_info_retry_without_delay() {
        assert_eq!(classify_gemini_error(500, None), RetryDecision::retry());
        assert_eq!(classify_gemini_error(503, None), RetryDecision::retry());
        assert_eq!(classify_gemini_error(404, None), RetryDecision::no_retry());
    }

    #[test]
    fn duration_units() {
        assert_eq!(parse_duration("42s"), Some(Duration::from_secs(42)));
        assert_eq!(parse_duration("1.5s"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration(" 3s "), Some(Duration::from_secs(3)));
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("42"), None);
        assert_eq!(parse_duration("-1s"), None);
    }

    #[test]
    fn object_form_retry_delay() {
        let envelope: GoogleErrorEnvelope =
            serde_json::from_value(quota_envelope(json!({"seconds": "3", "nanos": 500000000})))
                .unwrap();
        assert_eq!(
            classify_gemini_error(429, Some(&envelope)),
            RetryDecision::retry_after(Duration::from_millis(3500))
        );
    }

    #[test]
    fn out_of_range_object_delay_degrades() {
        let envelope: GoogleErrorEnvelope = serde_json::from_value(quota_envelope(
            json!({"seconds": "18446744073709551615", "nanos": 2000000000}),
        ))
        .unwrap();
        assert_eq!(
            classify_gemini_error(429, Some(&envelope)),
            RetryDecision::retry()
        );

        let envelope: GoogleErrorEnvelope = serde_json::from_value(quota_envelope(
            json!({"seconds": "3", "nanos": 1000000000}),
        ))
        .unwrap();
        assert_eq!(
            classify_gemini_error(429, Some(&envelope)),
            RetryDecision::retry()
        );
    }

    #[traced_test]
    #[test]
    fn unparseable_delay_degrades_and_warns() {
        let envelope: GoogleErrorEnvelope =
            serde_json::from_value(quota_envelope(json!("whenever"))).unwrap();
        assert_eq!(
            classify_gemini_error(429, Some(&envelope)),
            RetryDecision::retry()
        );
        assert!(logs_contain("unparseable retryDelay"));
    }

    #[test]
    fn non_json_bodies_keep_a_sample() {
        let err = classify_gemini_http_error(502, "<html>Bad Gateway</html>");
        match &err {
            LlmError::ApiError {
                code,
                message,
                details,
            } => {
                assert_eq!(*code, 502);
                assert!(message.contains("Bad Gateway"));
                assert!(details.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(retry_decision_for_error(&err), RetryDecision::retry());
        assert!(classify_gemini_http_error(500, "").to_string().contains("HTTP 500"));
    }

    #[test]
    fn transport_and_local_errors() {
        assert_eq!(
            retry_decision_for_error(&LlmError::TimeoutError("slow".into())),
            RetryDecision::retry()
        );
        assert_eq!(
            retry_decision_for_error(&LlmError::ConnectionError("refused".into())),
            RetryDecision::retry()
        );
        assert_eq!(
            retry_decision_for_error(&LlmError::ConfigurationError("bad".into())),
            RetryDecision::no_retry()
        );
        assert_eq!(
            retry_decision_for_error(&LlmError::AuthenticationError("key".into())),
            RetryDecision::no_retry()
        );
    }
}
