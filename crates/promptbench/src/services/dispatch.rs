//! Dispatch - build completion requests and route them to providers
//!
//! A dispatch is split in three steps so that independent runs can overlap
//! without holding the workbench borrowed across the network call:
//!
//! 1. the workbench snapshots the target into a [`PendingDispatch`] and marks
//!    the prompt in flight,
//! 2. [`PendingDispatch::send`] performs the call with no state borrowed,
//! 3. the workbench writes the result into the prompt's output and clears
//!    the marker.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::adapters::OpenAiClient;
use crate::domain::errors::DomainError;
use crate::domain::{ModelConfig, PromptContent, Provider, Variable};
use crate::ports::{ChatMessage, CompletionProvider, CompletionRequest};
use crate::services::template::substitute_pair;

/// Result of one dispatch as seen by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The completion text was written to the prompt's output
    Completed,
    /// The call failed; the error text was written to the prompt's output
    Failed(String),
    /// No request path exists for the model's provider; output untouched
    Unsupported(Provider),
    /// The model or prompt does not exist (or is not runnable); nothing changed
    Skipped,
    /// The prompt already has a dispatch in flight; nothing changed
    Busy,
}

impl DispatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, DispatchOutcome::Completed)
    }
}

/// Providers with an implemented request path
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: HashMap<Provider, Arc<dyn CompletionProvider>>,
}

impl ProviderRegistry {
    /// A registry with no providers
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register (or replace) the implementation for its provider tag
    pub fn register(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.providers.insert(provider.provider(), provider);
        self
    }

    pub fn get(&self, provider: Provider) -> Option<Arc<dyn CompletionProvider>> {
        self.providers.get(&provider).cloned()
    }

    pub fn supports(&self, provider: Provider) -> bool {
        self.providers.contains_key(&provider)
    }
}

impl Default for ProviderRegistry {
    /// Only the OpenAI-style request shape is implemented
    fn default() -> Self {
        Self::empty().register(Arc::new(OpenAiClient::new()))
    }
}

/// Build the two-message request for a model after variable substitution
pub fn build_request(
    model: &ModelConfig,
    content: &PromptContent,
    variables: &[Variable],
) -> CompletionRequest {
    let substituted = substitute_pair(content, variables);
    CompletionRequest {
        endpoint: model.endpoint.clone(),
        api_key: model.api_key.clone(),
        model: model.model.clone(),
        messages: vec![
            ChatMessage::system(substituted.system_prompt),
            ChatMessage::user(substituted.user_prompt),
        ],
        temperature: model.temperature,
        max_tokens: model.max_tokens,
    }
}

/// Output text recorded for a failed dispatch
pub fn error_output(err: &DomainError) -> String {
    format!("Error: {}", err)
}

/// A dispatch that has been snapshotted and marked in flight
pub struct PendingDispatch {
    pub model_id: Uuid,
    pub prompt_id: Uuid,
    pub request: CompletionRequest,
    provider: Arc<dyn CompletionProvider>,
}

impl PendingDispatch {
    pub(crate) fn new(
        model_id: Uuid,
        prompt_id: Uuid,
        request: CompletionRequest,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            model_id,
            prompt_id,
            request,
            provider,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider.provider()
    }

    /// Perform the remote call
    pub async fn send(&self) -> Result<String, DomainError> {
        tracing::debug!(
            model_id = %self.model_id,
            prompt_id = %self.prompt_id,
            endpoint = %self.request.endpoint,
            model = %self.request.model,
            "Dispatching prompt"
        );
        self.provider.complete(&self.request).await
    }
}

impl std::fmt::Debug for PendingDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingDispatch")
            .field("model_id", &self.model_id)
            .field("prompt_id", &self.prompt_id)
            .field("provider", &self.provider())
            .field("request", &self.request)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelUpdate;
    use crate::ports::MessageRole;

    #[test]
    fn test_build_request_substitutes_and_copies_settings() {
        let model = ModelConfig::default()
            .with_update(ModelUpdate::Model("gpt-4o-mini".into()))
            .with_update(ModelUpdate::ApiKey("sk-test".into()))
            .with_update(ModelUpdate::Temperature(0.1))
            .with_update(ModelUpdate::MaxTokens(32));
        let content = PromptContent::new("Answer in {lang}.", "What is {thing}?");
        let variables = vec![Variable::new("lang", "German"), Variable::new("thing", "Rust")];

        let request = build_request(&model, &content, &variables);

        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.api_key, "sk-test");
        assert_eq!(request.endpoint, model.endpoint);
        assert_eq!(request.temperature, 0.1);
        assert_eq!(request.max_tokens, 32);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert_eq!(request.messages[0].content, "Answer in German.");
        assert_eq!(request.messages[1].role, MessageRole::User);
        assert_eq!(request.messages[1].content, "What is Rust?");
    }

    #[test]
    fn test_default_registry_has_no_anthropic_path() {
        let registry = ProviderRegistry::default();
        assert!(registry.supports(Provider::OpenAI));
        assert!(!registry.supports(Provider::Anthropic));
    }

    #[test]
    fn test_request_debug_hides_key() {
        let model = ModelConfig::default().with_update(ModelUpdate::ApiKey("sk-hidden".into()));
        let request = build_request(&model, &PromptContent::default(), &[]);
        assert!(!format!("{:?}", request).contains("sk-hidden"));
    }

    #[test]
    fn test_error_output_prefix() {
        let err = DomainError::ExternalService("Request failed with status code 401".into());
        assert_eq!(error_output(&err), "Error: Request failed with status code 401");
    }
}
