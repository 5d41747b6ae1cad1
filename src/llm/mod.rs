use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod classifier;
pub mod extract;
pub mod prompts;
pub mod scorer;

use crate::config::LlmConfig;
use crate::error::StudioError;

/// Per-call completion parameters. The classifier and the scorer use
/// different budgets against the same endpoint.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

/// Seam for the chat-completion endpoint so the pipeline can be tested
/// without the network.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Send one user prompt and return the raw assistant text
    async fn complete(&self, prompt: &str, options: &ChatOptions) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// HTTP client for an OpenAI-compatible `/chat/completions` endpoint with
/// bearer-token auth.
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        let bearer = format!("Bearer {}", config.api_key);
        let mut auth_value = HeaderValue::from_str(&bearer)
            .map_err(|_| StudioError::config("API key contains invalid header characters"))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ChatApi for ChatClient {
    async fn complete(&self, prompt: &str, options: &ChatOptions) -> Result<String> {
        let body = ChatRequestBody {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        debug!(endpoint = %self.endpoint, max_tokens = options.max_tokens, "sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(options.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StudioError::HttpStatus {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            }
            .into());
        }

        let parsed: ChatResponse = response.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| StudioError::llm("completion response has no choices"))?;

        Ok(choice.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequestBody {
            model: "test-model",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            max_tokens: 800,
            temperature: 0.2,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert_eq!(json["max_tokens"], 800);
    }

    #[test]
    fn test_response_content_path() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": "ok"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "ok");
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let config = LlmConfig {
            base_url: "http://localhost:4000/api/v1/".to_string(),
            api_key: "key".to_string(),
            model: "m".to_string(),
        };
        let client = ChatClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "http://localhost:4000/api/v1/chat/completions");
    }
}
