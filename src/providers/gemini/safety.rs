//! Safety threshold mapping
//!
//! Translates caller-facing safety settings (`{"hate_speech": "low"}`) into
//! the `safetySettings` list Gemini expects. The output always covers every
//! known category: categories the caller does not name are sent as
//! `BLOCK_NONE` rather than left to the backend default.

use std::collections::BTreeMap;

use crate::error::LlmError;

use super::types::{SafetyCategory, SafetySetting, SafetyThreshold};

/// Settings sent when the caller configures nothing.
pub const DEFAULT_SAFETY_SETTINGS: [SafetySetting; 5] = [
    SafetySetting {
        category: SafetyCategory::Harassment,
        threshold: SafetyThreshold::BlockNone,
    },
    SafetySetting {
        category: SafetyCategory::HateSpeech,
        threshold: SafetyThreshold::BlockNone,
    },
    SafetySetting {
        category: SafetyCategory::SexuallyExplicit,
        threshold: SafetyThreshold::BlockNone,
    },
    SafetySetting {
        category: SafetyCategory::DangerousContent,
        threshold: SafetyThreshold::BlockNone,
    },
    SafetySetting {
        category: SafetyCategory::CivicIntegrity,
        threshold: SafetyThreshold::BlockNone,
    },
];

/// Uppercase, with hyphens and spaces folded to underscores.
fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Resolve a caller category name.
///
/// Accepts the short form (`harassment`), the backend form
/// (`HARM_CATEGORY_HARASSMENT`) and a few common synonyms (`hate`, `sexual`,
/// `dangerous`).
pub fn parse_safety_category(name: &str) -> Result<SafetyCategory, LlmError> {
    let normalized = normalize(name);
    let key = normalized
        .strip_prefix("HARM_CATEGORY_")
        .unwrap_or(&normalized);

    match key {
        "HARASSMENT" => Ok(SafetyCategory::Harassment),
        "HATE_SPEECH" | "HATE" => Ok(SafetyCategory::HateSpeech),
        "SEXUALLY_EXPLICIT" | "SEXUAL" | "SEXUAL_CONTENT" => Ok(SafetyCategory::SexuallyExplicit),
        "DANGEROUS_CONTENT" | "DANGEROUS" => Ok(SafetyCategory::DangerousContent),
        "CIVIC_INTEGRITY" | "CIVIC" => Ok(SafetyCategory::CivicIntegrity),
        _ => Err(LlmError::ConfigurationError(format!(
            "unknown safety category '{name}'"
        ))),
    }
}

/// Resolve a caller threshold name.
///
/// `low`, `low_and_above`, `BLOCK_LOW_AND_ABOVE` and `Low-And-Above` are the
/// same threshold.
pub fn parse_safety_threshold(name: &str) -> Result<SafetyThreshold, LlmError> {
    let normalized = normalize(name);
    if normalized == "HARM_BLOCK_THRESHOLD_UNSPECIFIED" {
        return Ok(SafetyThreshold::Unspecified);
    }
    let key = normalized.strip_prefix("BLOCK_").unwrap_or(&normalized);

    match key {
        "LOW" | "LOW_AND_ABOVE" => Ok(SafetyThreshold::BlockLowAndAbove),
        "MEDIUM" | "MEDIUM_AND_ABOVE" => Ok(SafetyThreshold::BlockMediumAndAbove),
        "HIGH" | "ONLY_HIGH" | "HIGH_AND_ABOVE" => Ok(SafetyThreshold::BlockOnlyHigh),
        "NONE" => Ok(SafetyThreshold::BlockNone),
        "OFF" => Ok(SafetyThreshold::Off),
        "DEFAULT" | "UNSPECIFIED" => Ok(SafetyThreshold::Unspecified),
        _ => Err(LlmError::ConfigurationError(format!(
            "unknown safety threshold '{name}'"
        ))),
    }
}

/// Map caller settings onto the full backend list, ordered by category.
///
/// Unnamed categories get `BLOCK_NONE`. Two entries that resolve to the same
/// category must agree on the threshold.
pub fn map_safety_settings<I, K, V>(settings: I) -> Result<Vec<SafetySetting>, LlmError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut explicit: BTreeMap<SafetyCategory, (String, SafetyThreshold)> = BTreeMap::new();

    for (name, threshold_name) in settings {
        let (name, threshold_name) = (name.as_ref(), threshold_name.as_ref());
        let category = parse_safety_category(name)?;
        let threshold = parse_safety_threshold(threshold_name)?;

        if let Some((previous, existing)) = explicit.get(&category) {
            if *existing != threshold {
                return Err(LlmError::ConfigurationError(format!(
                    "conflicting safety settings for {}: '{previous}' sets {}, '{name}' sets {}",
                    category.as_str(),
                    existing.as_str(),
                    threshold.as_str()
                )));
            }
            continue;
        }
        explicit.insert(category, (name.to_string(), threshold));
    }

    let mut mapped: BTreeMap<SafetyCategory, SafetyThreshold> = DEFAULT_SAFETY_SETTINGS
        .iter()
        .map(|s| (s.category, s.threshold))
        .collect();
    for (category, (_, threshold)) in explicit {
        mapped.insert(category, threshold);
    }

    Ok(mapped
        .into_iter()
        .map(|(category, threshold)| SafetySetting {
            category,
            threshold,
        })
        .collect())
}

/// Read caller settings given as a JSON object, or as a string holding one.
///
/// Values must be strings.
pub fn parse_safety_settings_value(
    value: &serde_json::Value,
) -> Result<BTreeMap<String, String>, LlmError> {
    match value {
        serde_json::Value::String(encoded) => {
            let decoded: serde_json::Value = serde_json::from_str(encoded).map_err(|e| {
                LlmError::ConfigurationError(format!("safety_settings is not valid JSON: {e}"))
            })?;
            match decoded {
                serde_json::Value::Object(_) => parse_safety_settings_value(&decoded),
                _ => Err(LlmError::ConfigurationError(
                    "safety_settings must encode a JSON object".to_string(),
                )),
            }
        }
        serde_json::Value::Object(entries) => entries
            .iter()
            .map(|(category, threshold)| match threshold {
                serde_json::Value::String(threshold) => Ok((category.clone(), threshold.clone())),
                other => Err(LlmError::ConfigurationError(format!(
                    "safety threshold for '{category}' must be a string, got {other}"
                ))),
            })
            .collect(),
        other => Err(LlmError::ConfigurationError(format!(
            "safety_settings must be an object or a JSON string, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn threshold_for(settings: &[SafetySetting], category: SafetyCategory) -> SafetyThreshold {
        settings
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.threshold)
            .unwrap()
    }

    #[test]
    fn empty_input_yields_block_none_everywhere() {
        let settings = map_safety_settings(Vec::<(&str, &str)>::new()).unwrap();
        assert_eq!(settings, DEFAULT_SAFETY_SETTINGS.to_vec());
    }

    #[test]
    fn named_categories_override_defaults() {
        let settings = map_safety_settings([
            ("dangerous_content", "medium_and_above"),
            ("hate_speech", "low_and_above"),
        ])
        .unwrap();

        assert_eq!(settings.len(), DEFAULT_SAFETY_SETTINGS.len());
        assert_eq!(
            threshold_for(&settings, SafetyCategory::DangerousContent),
            SafetyThreshold::BlockMediumAndAbove
        );
        assert_eq!(
            threshold_for(&settings, SafetyCategory::HateSpeech),
            SafetyThreshold::BlockLowAndAbove
        );
        assert_eq!(
            threshold_for(&settings, SafetyCategory::Harassment),
            SafetyThreshold::BlockNone
        );
    }

    #[test]
    fn threshold_synonyms_agree() {
        for name in ["low", "low_and_above", "BLOCK_LOW_AND_ABOVE", "Low-And-Above"] {
            assert_eq!(
                parse_safety_threshold(name).unwrap(),
                SafetyThreshold::BlockLowAndAbove,
                "{name}"
            );
        }
        for name in ["high", "only_high", "high_and_above", "BLOCK_ONLY_HIGH"] {
            assert_eq!(
                parse_safety_threshold(name).unwrap(),
                SafetyThreshold::BlockOnlyHigh,
                "{name}"
            );
        }
        assert_eq!(
            parse_safety_threshold("none").unwrap(),
            SafetyThreshold::BlockNone
        );
        assert_eq!(parse_safety_threshold("off").unwrap(), SafetyThreshold::Off);
        assert_eq!(
            parse_safety_threshold("default").unwrap(),
            SafetyThreshold::Unspecified
        );
        assert_eq!(
            parse_safety_threshold("HARM_BLOCK_THRESHOLD_UNSPECIFIED").unwrap(),
            SafetyThreshold::Unspecified
        );
    }

    #[test]
    fn category_forms_agree() {
        for name in ["hate_speech", "HARM_CATEGORY_HATE_SPEECH", "hate speech", "hate"] {
            assert_eq!(
                parse_safety_category(name).unwrap(),
                SafetyCategory::HateSpeech,
                "{name}"
            );
        }
        assert_eq!(
            parse_safety_category("sexual").unwrap(),
            SafetyCategory::SexuallyExplicit
        );
        assert_eq!(
            parse_safety_category("civic-integrity").unwrap(),
            SafetyCategory::CivicIntegrity
        );
    }

    #[test]
    fn unknown_names_are_configuration_errors() {
        let err = map_safety_settings([("violence", "low")]).unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(ref m) if m.contains("violence")));

        let err = map_safety_settings([("harassment", "sometimes")]).unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(ref m) if m.contains("sometimes")));
        assert!(!err.is_retryable());
    }

    #[test]
    fn conflicting_aliases_are_rejected() {
        let err = map_safety_settings([("hate", "low"), ("hate_speech", "high")]).unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));

        // Agreeing aliases are fine
        let settings = map_safety_settings([("hate", "low"), ("hate_speech", "low_and_above")])
            .unwrap();
        assert_eq!(
            threshold_for(&settings, SafetyCategory::HateSpeech),
            SafetyThreshold::BlockLowAndAbove
        );
    }

    #[test]
    fn serializes_to_backend_identifiers() {
        let settings = map_safety_settings([("harassment", "medium")]).unwrap();
        let wire = serde_json::to_value(&settings).unwrap();
        assert_eq!(
            wire[0],
            json!({"category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_MEDIUM_AND_ABOVE"})
        );
    }

    #[test]
    fn settings_value_accepts_object_and_encoded_string() {
        let from_object =
            parse_safety_settings_value(&json!({"hate_speech": "low_and_above"})).unwrap();
        let from_string =
            parse_safety_settings_value(&json!("{\"hate_speech\": \"low_and_above\"}")).unwrap();
        assert_eq!(from_object, from_string);
        assert_eq!(from_object["hate_speech"], "low_and_above");
    }

    #[test]
    fn settings_value_rejects_other_shapes() {
        assert!(parse_safety_settings_value(&json!(["hate_speech"])).is_err());
        assert!(parse_safety_settings_value(&json!("not json")).is_err());
        assert!(parse_safety_settings_value(&json!("[1, 2]")).is_err());
        assert!(parse_safety_settings_value(&json!({"hate_speech": 3})).is_err());
    }
}
