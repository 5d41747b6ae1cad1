use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use super::{extract, prompts, ChatApi, ChatOptions};
use crate::model::{clamp_score, LlmOutcome, TasteProfile, TASTE_AXES};

const OPTIONS: ChatOptions = ChatOptions {
    max_tokens: 800,
    temperature: 0.2,
    timeout: Duration::from_secs(30),
};

/// Scores one whiskey's tasting note on the six sensory axes.
///
/// Never fails and never returns a partial profile: any failure at any
/// stage yields the all-3s default.
pub struct TasteScorer {
    api: Arc<dyn ChatApi>,
}

impl TasteScorer {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self { api }
    }

    pub async fn score(&self, name: &str, tasting_note: &str) -> LlmOutcome<TasteProfile> {
        let prompt = prompts::taste_prompt(name, tasting_note);

        match self.api.complete(&prompt, &OPTIONS).await {
            Ok(content) => match parse_response(&content) {
                Some(profile) => {
                    info!(name, summary = %profile.summary(), "taste profile parsed");
                    LlmOutcome::Parsed(profile)
                }
                None => {
                    warn!(name, "no taste_profile object in scoring response");
                    LlmOutcome::Fallback {
                        value: TasteProfile::default(),
                        reason: "JSON解析失敗".to_string(),
                    }
                }
            },
            Err(e) => {
                warn!(name, error = %e, "taste scoring request failed");
                LlmOutcome::Fallback {
                    value: TasteProfile::default(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Locate the `taste_profile` object in the response and validate it
pub(crate) fn parse_response(content: &str) -> Option<TasteProfile> {
    let value = extract::extract_object(content, &["taste_profile"])?;
    let profile = value.get("taste_profile")?;
    Some(validate_profile(profile))
}

/// Per-axis coercion. Numbers (and numeric strings) are truncated to an
/// integer then clamped into [1, 5]; anything non-numeric falls back to 3.
/// The coerce-then-clamp order is deliberate: an out-of-range number is
/// clamped, a non-numeric value is defaulted, and the two are not the same.
pub(crate) fn validate_profile(raw: &Value) -> TasteProfile {
    let mut values = [3i64; 6];
    for (i, axis) in TASTE_AXES.iter().enumerate() {
        values[i] = coerce_axis(raw.get(*axis));
    }
    TasteProfile::from_values(values)
}

fn coerce_axis(value: Option<&Value>) -> i64 {
    let Some(value) = value else {
        return 3;
    };
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i64::from(clamp_score(i))
            } else if let Some(f) = n.as_f64() {
                i64::from(clamp_score(f.trunc() as i64))
            } else {
                3
            }
        }
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(i) => i64::from(clamp_score(i)),
            Err(_) => 3,
        },
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_well_formed_response() {
        let content = r#"採点結果:
{
    "taste_profile": {
        "fruity": 4,
        "spicy": 2,
        "body": 3,
        "smoky": 5,
        "sweetness": 2,
        "complexity": 5
    }
}"#;
        let profile = parse_response(content).unwrap();
        assert_eq!(profile.values(), [4, 2, 3, 5, 2, 5]);
    }

    #[test]
    fn test_clamp_and_default_asymmetry() {
        // Out-of-range number is clamped; non-numeric string is defaulted
        let raw = json!({"fruity": 7, "spicy": "x"});
        let profile = validate_profile(&raw);
        assert_eq!(profile.fruity, 5);
        assert_eq!(profile.spicy, 3);
        assert_eq!(&profile.values()[2..], &[3, 3, 3, 3]);
    }

    #[test]
    fn test_numeric_string_is_clamped() {
        let raw = json!({"fruity": "4", "spicy": "9", "body": "2.5"});
        let profile = validate_profile(&raw);
        assert_eq!(profile.fruity, 4);
        assert_eq!(profile.spicy, 5);
        // "2.5" does not parse as an integer, so it defaults
        assert_eq!(profile.body, 3);
    }

    #[test]
    fn test_float_scores_truncate() {
        let raw = json!({"body": 4.9, "smoky": 0.2});
        let profile = validate_profile(&raw);
        assert_eq!(profile.body, 4);
        assert_eq!(profile.smoky, 1);
    }

    #[test]
    fn test_missing_keys_default() {
        let profile = validate_profile(&json!({}));
        assert_eq!(profile, TasteProfile::default());
    }

    #[test]
    fn test_response_without_profile_key() {
        assert!(parse_response(r#"{"scores": {"fruity": 4}}"#).is_none());
        assert!(parse_response("I cannot score this whiskey.").is_none());
    }
}
