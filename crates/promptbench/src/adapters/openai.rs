//! OpenAI-style chat completion client
//!
//! POSTs `{model, messages, temperature, max_tokens}` to the model's own
//! endpoint with a bearer token and reads `choices[0].message.content`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::value_objects::Provider;
use crate::ports::{ChatMessage, CompletionProvider, CompletionRequest};

/// Completion client for OpenAI-compatible endpoints
#[derive(Clone, Default)]
pub struct OpenAiClient {
    client: Client,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client with its own connection pool
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&request.endpoint)
            .header("Authorization", format!("Bearer {}", request.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::ExternalService(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DomainError::ExternalService(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let mut message = format!("Request failed with status code {}", status.as_u16());
            let text = text.trim();
            if !text.is_empty() {
                message.push_str(": ");
                message.push_str(text);
            }
            return Err(DomainError::ExternalService(message));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| DomainError::ExternalService(format!("Malformed response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| DomainError::ExternalService("Response contained no choices".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{echo_router, fixed_response_router, spawn_stub};
    use axum::http::StatusCode;

    fn request(endpoint: String) -> CompletionRequest {
        CompletionRequest {
            endpoint,
            api_key: "sk-local".into(),
            model: "gpt-test".into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hello")],
            temperature: 0.5,
            max_tokens: 16,
        }
    }

    #[tokio::test]
    async fn test_posts_expected_shape() {
        let endpoint = spawn_stub(echo_router()).await;
        let output = OpenAiClient::new().complete(&request(endpoint)).await.unwrap();
        assert_eq!(output, "Bearer sk-local|gpt-test|system:sys|user:hello|0.5|16");
    }

    #[tokio::test]
    async fn test_unauthorized_status_is_reported() {
        let endpoint =
            spawn_stub(fixed_response_router(StatusCode::UNAUTHORIZED, "invalid api key")).await;
        let err = OpenAiClient::new().complete(&request(endpoint)).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("401"), "{}", message);
        assert!(message.contains("invalid api key"), "{}", message);
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let endpoint = spawn_stub(fixed_response_router(StatusCode::OK, "not json")).await;
        let err = OpenAiClient::new().complete(&request(endpoint)).await.unwrap_err();
        assert!(err.to_string().starts_with("Malformed response"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let endpoint = spawn_stub(fixed_response_router(StatusCode::OK, r#"{"choices":[]}"#)).await;
        let err = OpenAiClient::new().complete(&request(endpoint)).await.unwrap_err();
        assert_eq!(err.to_string(), "Response contained no choices");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let err = OpenAiClient::new()
            .complete(&request("http://127.0.0.1:1/v1/chat/completions".into()))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Request failed"));
    }
}
