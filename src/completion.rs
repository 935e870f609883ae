//! AI completion collaborator (OpenAI-compatible chat completions)

use crate::LaWanderError;
use crate::config::CompletionConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};

/// One prompt in, one response text out
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
    }
}

/// Client for `<base_url>/v1/chat/completions` with a bearer key
pub struct ChatCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionClient {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| LaWanderError::config("No completion API key configured"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionClient {
    #[instrument(skip_all, fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let start_time = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LaWanderError::api(format!("Completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Completion endpoint returned {}: {}", status, body);
            return Err(LaWanderError::api(format!("Completion endpoint returned HTTP {status}")).into());
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse completion response")?;

        let text = parsed
            .into_text()
            .ok_or_else(|| LaWanderError::completion("Completion response contained no text"))?;

        info!(
            "Completion returned {} chars in {:?}",
            text.len(),
            start_time.elapsed()
        );
        debug!("Completion text: {}", text);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest {
            model: "llama3.1-8b",
            messages: vec![ChatMessage {
                role: "user",
                content: "Plan a trip",
            }],
            temperature: 0.5,
            max_tokens: 2000,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "llama3.1-8b",
                "messages": [{"role": "user", "content": "Plan a trip"}],
                "temperature": 0.5,
                "max_tokens": 2000
            })
        );
    }

    #[test]
    fn test_response_text_is_first_choice() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"**Old Town** - walk"}},{"message":{"content":"ignored"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.into_text().as_deref(), Some("**Old Town** - walk"));
    }

    #[test]
    fn test_empty_response_has_no_text() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(parsed.into_text(), None);
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"  "}}]}"#).unwrap();
        assert_eq!(parsed.into_text(), None);
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = CompletionConfig::default();
        assert!(config.api_key.is_none());
        assert!(ChatCompletionClient::new(&config).is_err());
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = CompletionConfig {
            api_key: Some("test-key-123".to_string()),
            base_url: "https://api.example.com/".to_string(),
            ..CompletionConfig::default()
        };
        let client = ChatCompletionClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "https://api.example.com/v1/chat/completions");
    }
}
