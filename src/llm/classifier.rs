use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::{extract, prompts, ChatApi, ChatOptions};
use crate::model::{Classification, LlmOutcome};

/// Required keys for a classification response to count as parsed.
/// `confidence` is optional.
const REQUIRED_KEYS: [&str; 5] = [
    "classification",
    "region",
    "sub_category",
    "tasting_notes_english",
    "tasting_notes_japanese",
];

const OPTIONS: ChatOptions = ChatOptions {
    max_tokens: 1200,
    temperature: 0.3,
    timeout: Duration::from_secs(45),
};

/// Classifies one whiskey from its name plus search snippets.
///
/// Never fails: every error path collapses into the canned fallback object
/// with `confidence = "Low"`.
pub struct Classifier {
    api: Arc<dyn ChatApi>,
}

impl Classifier {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self { api }
    }

    pub async fn classify(&self, name: &str, search_context: &str) -> LlmOutcome<Classification> {
        let prompt = prompts::classification_prompt(name, search_context);

        match self.api.complete(&prompt, &OPTIONS).await {
            Ok(content) => match parse_response(&content) {
                Some(classification) => {
                    info!(name, category = %classification.classification, "classification parsed");
                    LlmOutcome::Parsed(classification)
                }
                None => {
                    warn!(name, "no qualifying JSON object in classification response");
                    LlmOutcome::Fallback {
                        value: Classification::fallback(name),
                        reason: "JSON解析失敗".to_string(),
                    }
                }
            },
            Err(e) => {
                warn!(name, error = %e, "classification request failed");
                LlmOutcome::Fallback {
                    value: Classification::fallback(name),
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Find the first JSON object carrying all five required fields and
/// deserialize it.
pub(crate) fn parse_response(content: &str) -> Option<Classification> {
    let value = extract::extract_object(content, &REQUIRED_KEYS)?;
    serde_json::from_value(value).ok()
}
