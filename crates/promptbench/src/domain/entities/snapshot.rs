//! Saved snapshots - named copies of prompts, models and variable sets
//!
//! Snapshots are immutable once created. Their serialized shapes are the
//! on-disk format of the snapshot library.

use serde::{Deserialize, Serialize};

use super::model_config::redact;
use super::{ModelConfig, Prompt, Variable};
use crate::domain::value_objects::Provider;

/// A system/user text pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptContent {
    pub system_prompt: String,
    pub user_prompt: String,
}

impl PromptContent {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
        }
    }
}

impl From<&Prompt> for PromptContent {
    fn from(prompt: &Prompt) -> Self {
        Self::new(prompt.system_prompt.clone(), prompt.user_prompt.clone())
    }
}

/// Saved prompt pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPrompt {
    pub name: String,
    pub content: PromptContent,
}

/// A prompt as carried inside a saved model
///
/// The ID is kept as raw JSON; stores written by other clients use numeric
/// IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPrompt {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub user_prompt: String,
    #[serde(default)]
    pub output: String,
}

impl From<&Prompt> for SnapshotPrompt {
    fn from(prompt: &Prompt) -> Self {
        Self {
            id: serde_json::Value::String(prompt.id.to_string()),
            system_prompt: prompt.system_prompt.clone(),
            user_prompt: prompt.user_prompt.clone(),
            output: prompt.output.clone(),
        }
    }
}

/// A ModelConfig without its identifier
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSnapshot {
    pub provider: Provider,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub api_key: String,
    pub endpoint: String,
    /// Kept for reference; loading never replaces a target's prompts
    #[serde(default)]
    pub prompts: Vec<SnapshotPrompt>,
}

impl From<&ModelConfig> for ModelSnapshot {
    fn from(config: &ModelConfig) -> Self {
        Self {
            provider: config.provider,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            prompts: config.prompts.iter().map(SnapshotPrompt::from).collect(),
        }
    }
}

impl std::fmt::Debug for ModelSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSnapshot")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &redact(&self.api_key))
            .field("endpoint", &self.endpoint)
            .field("prompts", &self.prompts.len())
            .finish()
    }
}

impl ModelConfig {
    /// Overwrite settings from a snapshot, keeping this model's ID and prompts
    pub fn with_snapshot(&self, snapshot: &ModelSnapshot) -> Self {
        Self {
            id: self.id,
            provider: snapshot.provider,
            model: snapshot.model.clone(),
            temperature: snapshot.temperature,
            max_tokens: snapshot.max_tokens,
            api_key: snapshot.api_key.clone(),
            endpoint: snapshot.endpoint.clone(),
            prompts: self.prompts.clone(),
        }
    }
}

/// Saved model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModel {
    pub name: String,
    pub config: ModelSnapshot,
}

/// Saved variable list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedVariableSet {
    pub name: String,
    pub variables: Vec<Variable>,
}

/// Anything stored in the snapshot library under a name
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for SavedPrompt {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for SavedModel {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for SavedVariableSet {
    fn name(&self) -> &str {
        &self.name
    }
}
