//! Completion Provider Port
//!
//! Abstract interface for one-shot chat completions. Every request carries
//! its own endpoint and key, since each model config points at its own
//! backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::value_objects::Provider;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

/// A message in a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
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
}

/// A fully substituted completion request
#[derive(Clone, PartialEq)]
pub struct CompletionRequest {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// Always `[system, user]`
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl std::fmt::Debug for CompletionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionRequest")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("messages", &self.messages)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

/// Completion provider interface
///
/// One implementation per provider request shape.
///
/// # Example
///
/// ```rust,ignore
/// use promptbench::ports::CompletionProvider;
///
/// struct EchoProvider;
///
/// #[async_trait]
/// impl CompletionProvider for EchoProvider {
///     fn provider(&self) -> Provider { Provider::OpenAI }
///
///     async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
///         Ok(request.messages[1].content.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// The provider tag this implementation serves
    fn provider(&self) -> Provider;

    /// Send the request and return the first completion's text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError>;
}
