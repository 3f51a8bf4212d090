//! Text-generation API client.
//!
//! The pipeline only depends on [`TextGenerator`]. [`HttpGenerator`] speaks
//! the OpenAI-compatible chat completions protocol.

use crate::{
    config::Config,
    error::{Error, Result},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Something that reformats text according to system instructions.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends `instructions` and `text` and returns the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredential`] when the service rejects the
    /// credential and [`Error::Processing`] for any other failure.
    async fn generate(&self, instructions: &str, text: &str, credential: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
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
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// HTTP client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl HttpGenerator {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    #[instrument(skip_all, fields(endpoint = %self.endpoint, model = %self.model))]
    async fn generate(&self, instructions: &str, text: &str, credential: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: instructions,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if !credential.is_empty() {
            request = request.bearer_auth(credential);
        }

        debug!("Sending {} chars for reformatting", text.chars().count());
        let response = request.send().await?;
        let status = response.status();
        let payload = response.text().await?;

        if !status.is_success() {
            warn!("API returned {}", status);
            return Err(status_error(status, &payload));
        }

        parse_completion(&payload)
    }
}

/// Maps a non-success HTTP status to the matching error kind.
fn status_error(status: StatusCode, body: &str) -> Error {
    let detail = api_error_message(body).unwrap_or_else(|| body.trim().to_string());
    let message = if detail.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {detail}")
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::invalid_credential(message),
        _ => Error::processing(message),
    }
}

/// Extracts `error.message` (or a string `error`) from an API error body.
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(serde_json::Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
}

/// Returns the first choice's message content.
fn parse_completion(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| Error::processing(format!("Malformed API response: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::processing("API response contained no content"))
}
