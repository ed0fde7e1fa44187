pub mod schema;
pub(crate) mod types;

pub use schema::StructuredOutput;

use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::debug;

use types::{ChatRequest, ChatResponse, ResponseFormat, WireMessage};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

// =============================================================================
// Message Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// OpenAi Client
// =============================================================================

#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_URL.to_string(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// One-shot chat completion: system prompt plus a single user message.
    pub async fn chat(&self, system: &str, user: &str) -> Result<String> {
        self.chat_messages(system, &[Message::user(user)]).await
    }

    /// Chat completion over an explicit message history.
    pub async fn chat_messages(&self, system: &str, messages: &[Message]) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: wire_messages(system, messages),
            temperature: Some(0.0),
            max_tokens: Some(4096),
            response_format: None,
        };

        let response = self.send(&request).await?;
        first_content(response)
    }

    /// Schema-constrained extraction of a typed value from one user message.
    pub async fn extract<T: StructuredOutput>(&self, system: &str, user: &str) -> Result<T> {
        self.extract_messages(system, &[Message::user(user)]).await
    }

    /// Schema-constrained extraction conditioned on a full message history.
    pub async fn extract_messages<T: StructuredOutput>(
        &self,
        system: &str,
        messages: &[Message],
    ) -> Result<T> {
        debug!(type_name = T::type_name(), "Structured output extraction");

        let request = ChatRequest {
            model: self.model.clone(),
            messages: wire_messages(system, messages),
            temperature: Some(0.0),
            max_tokens: None,
            response_format: Some(ResponseFormat::strict::<T>()),
        };

        let response = self.send(&request).await?;
        let json_str = first_content(response)?;

        serde_json::from_str(&json_str)
            .map_err(|e| anyhow!("Failed to deserialize structured response: {e}"))
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %request.model, "OpenAI chat request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("OpenAI API error ({status}): {error_text}"));
        }

        Ok(response.json().await?)
    }
}

fn wire_messages(system: &str, messages: &[Message]) -> Vec<WireMessage> {
    let mut wire = Vec::with_capacity(messages.len() + 1);
    if !system.is_empty() {
        wire.push(WireMessage::system(system));
    }
    for msg in messages {
        wire.push(match msg.role {
            MessageRole::System => WireMessage::system(&msg.content),
            MessageRole::User => WireMessage::user(&msg.content),
            MessageRole::Assistant => WireMessage::assistant(&msg.content),
        });
    }
    wire
}

fn first_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow!("No response from OpenAI"))
}
