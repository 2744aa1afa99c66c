//! ModelConfig - A completion backend with its own prompt slots

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Prompt;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{check_max_tokens, check_temperature, ModelUpdate, Provider};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Settings applied to newly added models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefaults {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            endpoint: default_endpoint(),
        }
    }
}

impl ModelDefaults {
    /// Apply the same range checks as a live field update
    pub fn validate(&self) -> Result<(), DomainError> {
        check_temperature(self.temperature)?;
        check_max_tokens(self.max_tokens)?;
        Ok(())
    }
}

/// ModelConfig - provider settings plus the prompts it owns
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub id: Uuid,
    pub provider: Provider,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub api_key: String,
    pub endpoint: String,
    pub prompts: Vec<Prompt>,
}

impl ModelConfig {
    /// Create a model from defaults with one blank prompt
    pub fn new(defaults: &ModelDefaults) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider: defaults.provider,
            model: defaults.model.clone(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            api_key: String::new(),
            endpoint: defaults.endpoint.clone(),
            prompts: vec![Prompt::new()],
        }
    }

    pub fn prompt(&self, prompt_id: Uuid) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.id == prompt_id)
    }

    /// Return a copy with one settings field replaced
    pub fn with_update(&self, update: ModelUpdate) -> Self {
        let mut next = self.clone();
        match update {
            ModelUpdate::Provider(provider) => next.provider = provider,
            ModelUpdate::Model(model) => next.model = model,
            ModelUpdate::Temperature(temperature) => next.temperature = temperature,
            ModelUpdate::MaxTokens(max_tokens) => next.max_tokens = max_tokens,
            ModelUpdate::ApiKey(api_key) => next.api_key = api_key,
            ModelUpdate::Endpoint(endpoint) => next.endpoint = endpoint,
        }
        next
    }

    /// Return a copy with the prompt list replaced
    pub fn with_prompts(&self, prompts: Vec<Prompt>) -> Self {
        Self {
            prompts,
            ..self.clone()
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(&ModelDefaults::default())
    }
}

// API keys stay out of logs and debug output
impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &redact(&self.api_key))
            .field("endpoint", &self.endpoint)
            .field("prompts", &self.prompts)
            .finish()
    }
}

pub(crate) fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}
