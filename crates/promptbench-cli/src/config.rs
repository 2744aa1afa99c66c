//! Configuration management for Promptbench CLI
//!
//! Reads tool settings from ~/.config/promptbench/config.toml. Live model
//! settings (API keys included) are never written here; they persist only
//! through saved models.

use anyhow::{Context, Result};
use promptbench::ModelDefaults;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "promptbench";
const CONFIG_FILE: &str = "config.toml";

/// CLI Configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Where saved prompts, models and variable sets are stored
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Settings for newly added models
    #[serde(default)]
    pub defaults: ModelDefaults,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join(CONFIG_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load config from the given file or the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config
            .defaults
            .validate()
            .context("Invalid [defaults] in config file")?;
        Ok(config)
    }

    /// Resolve the snapshot data directory
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let dir = dirs::data_dir()
            .context("Could not determine data directory")?
            .join(CONFIG_DIR);
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptbench::Provider;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert!(config.data_dir.is_none());
        assert_eq!(config.defaults, ModelDefaults::default());
    }

    #[test]
    fn test_partial_defaults_table() {
        let config = Config::parse(
            r#"
data_dir = "/tmp/pb"

[defaults]
model = "gpt-4o-mini"
max_tokens = 256
"#,
        )
        .unwrap();

        assert_eq!(config.data_dir.as_deref(), Some(Path::new("/tmp/pb")));
        assert_eq!(config.defaults.model, "gpt-4o-mini");
        assert_eq!(config.defaults.max_tokens, 256);
        assert_eq!(config.defaults.provider, Provider::OpenAI);
        assert_eq!(config.defaults.temperature, 0.7);
    }

    #[test]
    fn test_invalid_provider_is_rejected() {
        assert!(Config::parse("[defaults]\nprovider = \"google\"\n").is_err());
    }

    #[test]
    fn test_out_of_range_defaults_are_rejected() {
        assert!(Config::parse("[defaults]\nmax_tokens = 0\n").is_err());
        assert!(Config::parse("[defaults]\ntemperature = 5.0\n").is_err());
        assert!(Config::parse("[defaults]\ntemperature = 1.0\n").is_ok());
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        let config = Config {
            data_dir: Some(PathBuf::from("/srv/prompts")),
            ..Config::default()
        };
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/srv/prompts"));
    }
}
