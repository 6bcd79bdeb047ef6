//! HTTP inference backend — OpenAI-compatible chat completions over reqwest.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;
use crate::llm::InferenceBackend;

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct HttpInference {
    url: String,
    model: String,
    api_key: SecretString,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl HttpInference {
    pub fn new(url: String, model: String, api_key: SecretString) -> Self {
        Self {
            url,
            model,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl InferenceBackend for HttpInference {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<Option<String>, InferenceError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
        };

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::RequestFailed {
                backend: "http".into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(InferenceError::RequestFailed {
                backend: "http".into(),
                reason: format!("status {status}: {detail}"),
            });
        }

        let text = resp
            .text()
            .await
            .map_err(|e| InferenceError::RequestFailed {
                backend: "http".into(),
                reason: e.to_string(),
            })?;

        content_from_body(&text)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Decode a chat-completions body into its first message content.
///
/// A body that is not a chat-response object is an error; an object with
/// missing or empty choices/content is `Ok(None)` so callers can degrade.
fn content_from_body(text: &str) -> Result<Option<String>, InferenceError> {
    let parsed: ChatResponse =
        serde_json::from_str(text).map_err(|e| InferenceError::InvalidResponse {
            backend: "http".into(),
            reason: format!("body is not a chat response: {e}"),
        })?;

    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|content| !content.trim().is_empty()))
}

// ── Tests ───────────────────────────────────────────────────────────
