//! Prompt - A system/user prompt pair owned by a model config

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::PromptField;

/// Prompt - one editable prompt slot with its last run output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: Uuid,
    pub system_prompt: String,
    pub user_prompt: String,
    /// Empty until a run completes or fails
    pub output: String,
}

impl Prompt {
    /// Create a blank prompt with a fresh ID
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            system_prompt: String::new(),
            user_prompt: String::new(),
            output: String::new(),
        }
    }

    /// Return a copy with one field replaced
    pub fn with_field(&self, field: PromptField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        match field {
            PromptField::SystemPrompt => next.system_prompt = value.into(),
            PromptField::UserPrompt => next.user_prompt = value.into(),
            PromptField::Output => next.output = value.into(),
        }
        next
    }
}

impl Default for Prompt {
    fn default() -> Self {
        Self::new()
    }
}
