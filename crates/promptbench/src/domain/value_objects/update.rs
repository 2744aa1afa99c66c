//! Field updates for live workbench entities
//!
//! Each enum names exactly one field and carries its new value, so a
//! setter can replace one field while leaving siblings untouched.

use crate::domain::errors::DomainError;
use crate::domain::value_objects::Provider;

/// Update to a single ModelConfig field
#[derive(Debug, Clone, PartialEq)]
pub enum ModelUpdate {
    Provider(Provider),
    Model(String),
    Temperature(f32),
    MaxTokens(u32),
    ApiKey(String),
    Endpoint(String),
}

impl ModelUpdate {
    /// Field names accepted by [`ModelUpdate::parse`]
    pub const FIELDS: [&'static str; 6] = [
        "provider",
        "model",
        "temperature",
        "max-tokens",
        "api-key",
        "endpoint",
    ];

    /// Parse a field name and raw text into a validated update
    pub fn parse(field: &str, raw: &str) -> Result<Self, DomainError> {
        let field = field.trim().to_lowercase().replace('_', "-");
        match field.as_str() {
            "provider" => raw
                .parse::<Provider>()
                .map(ModelUpdate::Provider)
                .map_err(DomainError::Validation),
            "model" => Ok(ModelUpdate::Model(raw.to_string())),
            "temperature" | "temp" => {
                let value: f32 = raw
                    .trim()
                    .parse()
                    .map_err(|_| DomainError::validation(format!("Invalid temperature: {}", raw)))?;
                check_temperature(value).map(ModelUpdate::Temperature)
            }
            "max-tokens" | "maxtokens" => {
                let value: u32 = raw
                    .trim()
                    .parse()
                    .map_err(|_| DomainError::validation(format!("Invalid max tokens: {}", raw)))?;
                check_max_tokens(value).map(ModelUpdate::MaxTokens)
            }
            "api-key" | "apikey" | "key" => Ok(ModelUpdate::ApiKey(raw.to_string())),
            "endpoint" | "url" => Ok(ModelUpdate::Endpoint(raw.to_string())),
            _ => Err(DomainError::validation(format!(
                "Unknown model field: {}. Valid: {}",
                field,
                Self::FIELDS.join(", ")
            ))),
        }
    }
}

/// Temperature must be finite and within 0.0..=1.0
pub fn check_temperature(value: f32) -> Result<f32, DomainError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(DomainError::validation(format!(
            "Temperature must be between 0.0 and 1.0, got {}",
            value
        )));
    }
    Ok(value)
}

pub fn check_max_tokens(value: u32) -> Result<u32, DomainError> {
    if value == 0 {
        return Err(DomainError::validation("Max tokens must be positive"));
    }
    Ok(value)
}

/// Prompt text fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptField {
    SystemPrompt,
    UserPrompt,
    Output,
}

impl std::str::FromStr for PromptField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "system" | "system-prompt" | "systemprompt" => Ok(PromptField::SystemPrompt),
            "user" | "user-prompt" | "userprompt" => Ok(PromptField::UserPrompt),
            "output" => Ok(PromptField::Output),
            _ => Err(DomainError::validation(format!(
                "Unknown prompt field: {}. Valid: system, user, output",
                s
            ))),
        }
    }
}

/// Variable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableField {
    Name,
    Value,
}

impl std::str::FromStr for VariableField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(VariableField::Name),
            "value" => Ok(VariableField::Value),
            _ => Err(DomainError::validation(format!(
                "Unknown variable field: {}. Valid: name, value",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_temperature_bounds() {
        assert_eq!(
            ModelUpdate::parse("temperature", "0.3").unwrap(),
            ModelUpdate::Temperature(0.3)
        );
        assert!(ModelUpdate::parse("temperature", "1.5").is_err());
        assert!(ModelUpdate::parse("temperature", "NaN").is_err());
        assert!(ModelUpdate::parse("temperature", "warm").is_err());
    }

    #[test]
    fn test_parse_max_tokens_must_be_positive() {
        assert_eq!(
            ModelUpdate::parse("max_tokens", "256").unwrap(),
            ModelUpdate::MaxTokens(256)
        );
        assert!(ModelUpdate::parse("max-tokens", "0").is_err());
        assert!(ModelUpdate::parse("max-tokens", "-4").is_err());
    }

    #[test]
    fn test_parse_unknown_field() {
        let err = ModelUpdate::parse("top-p", "0.9").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_prompt_field_aliases() {
        assert_eq!("system".parse::<PromptField>().unwrap(), PromptField::SystemPrompt);
        assert_eq!("userPrompt".parse::<PromptField>().unwrap(), PromptField::UserPrompt);
        assert!("assistant".parse::<PromptField>().is_err());
    }
}
