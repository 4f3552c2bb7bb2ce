//! Text enrichment via an OpenAI-compatible chat-completion endpoint.

pub mod prompts;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Sampling temperature used by the original digest; kept fixed.
const TEMPERATURE: f32 = 1.3;
const MAX_TOKENS: u32 = 8192;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("completion contained no choices")]
    EmptyResponse,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Abstraction over the chat-completion call.
/// Implemented by `OpenAiClient` for production; mock implementations used in tests.
pub trait Enricher {
    async fn process(&self, text: &str, template: &str) -> Result<String, LlmError>;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(http: Client, api_key: &str, model: &str, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey(api_key.trim().to_string()),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

impl Enricher for OpenAiClient {
    async fn process(&self, text: &str, template: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: fill_template(template, text),
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key.0)
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ChatResponse>(&raw)
                .ok()
                .and_then(|body| body.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| {
                    format!("HTTP {status}: {}", truncate_to_boundary(&raw, 200))
                });
            warn!(code = status.as_u16(), "chat completion error");
            return Err(LlmError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        if let Some(err) = body.error {
            let message = err.message.unwrap_or_else(|| "unknown error".to_string());
            warn!(%message, "chat completion error in 200 response");
            return Err(LlmError::Api { code: 0, message });
        }

        let content = body
            .choices
            .and_then(|mut c| c.drain(..).next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or(LlmError::EmptyResponse)?;

        debug!(model = %self.model, chars = content.len(), "chat completion complete");
        Ok(content.trim().to_string())
    }
}

/// Substitute the input text into the instruction template.
fn fill_template(template: &str, text: &str) -> String {
    template.replace("{text}", text)
}

/// Truncate to at most `max` bytes without splitting a character.
fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
