//! Completion client seam.
//!
//! [`CompletionClient`] is the single boundary to the text-completion
//! provider: one call in, one raw completion out. No retries live here; a
//! caller wanting retry or cancellation wraps the client.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use leadcall_core::config::{AppConfig, LlmConfig};
use leadcall_core::{Message, PipelineError, Role};

/// Completion call failure, carrying the upstream description (missing
/// credential at the provider, network failure, quota). The pipeline stage
/// tag is added by the caller that knows which stage it was serving.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ProviderError(pub String);

/// The shapes a completion provider response can come back in. Providers and
/// client wrappers disagree on whether a completion is a bare string, a
/// wrapper object, or a batch of one; [`CompletionResponse::into_text`] is
/// the one place that flattens them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionResponse {
    Text(String),
    Wrapped { content: String },
    Batch(Vec<CompletionResponse>),
}

impl CompletionResponse {
    /// Normalizes any response shape to plain text. Idempotent on plain
    /// text; a single-element batch unwraps recursively; a multi-element
    /// batch stringifies by joining its parts in order.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Wrapped { content } => content,
            Self::Batch(mut parts) if parts.len() == 1 => parts.remove(0).into_text(),
            Self::Batch(parts) => {
                parts.into_iter().map(Self::into_text).collect::<Vec<_>>().join("\n")
            }
        }
    }
}

/// Maps an ordered, role-tagged message sequence to a completion.
///
/// Contract: `messages` is non-empty and conventionally starts with a
/// [`Role::System`] message establishing the persona. The returned text is
/// the model's raw output; stripping role prefixes is the caller's job.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<CompletionResponse, ProviderError>;
}

/// OpenAI-compatible chat-completions client (OpenRouter by default).
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenRouterClient {
    /// Fails fast with `CredentialMissing` when no key survived the config
    /// resolution chain, before any request is attempted.
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let api_key = config.require_llm_key()?.clone();
        Ok(Self::new(&config.llm, api_key))
    }

    pub fn new(llm: &LlmConfig, api_key: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            model: llm.model.clone(),
            temperature: llm.temperature,
            timeout: Duration::from_secs(llm.timeout_secs),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(&self, messages: &[Message]) -> Result<CompletionResponse, ProviderError> {
        if messages.is_empty() {
            return Err(ProviderError("completion requested with no messages".to_string()));
        }

        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: messages.iter().map(ChatMessage::from).collect(),
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|error| ProviderError(format!("request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError(format!("provider returned {status}: {}", body.trim())));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|error| ProviderError(format!("malformed provider response: {error}")))?;

        let mut choices = parsed.choices;
        match choices.len() {
            0 => Err(ProviderError("provider returned no choices".to_string())),
            1 => Ok(CompletionResponse::Wrapped {
                content: choices.remove(0).message.content,
            }),
            _ => Ok(CompletionResponse::Batch(
                choices
                    .into_iter()
                    .map(|choice| CompletionResponse::Wrapped { content: choice.message.content })
                    .collect(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        // Client lines travel as user turns and admin lines as authoritative
        // system context, matching how the dialogue engine frames history.
        let role = match message.role {
            Role::System => "system",
            Role::Client => "user",
            Role::Admin => "system",
        };
        Self { role, content: message.text.clone() }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}
