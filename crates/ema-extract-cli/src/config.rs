use anyhow::{Context, Result};
use ema_extract_llm::{GenerationConfig, DEFAULT_MODEL, DEFAULT_THINKING_BUDGET};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub schema_version: u32,
    pub model: String,
    /// `null` disables the thinking budget
    pub thinking_budget: Option<u32>,
    pub timeout_secs: u64,

    // Files
    pub credentials_path: Option<PathBuf>,
    pub prompt_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,

    pub default_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            model: DEFAULT_MODEL.to_string(),
            thinking_budget: Some(DEFAULT_THINKING_BUDGET),
            timeout_secs: 300,
            credentials_path: None,
            prompt_path: None,
            output_dir: None,
            default_format: OutputFormat::Outline,
        }
    }
}

impl Config {
    /// Load config from file, or create default
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .context("Failed to read config file")?;
            serde_json::from_str(&content)
                .context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .context("Failed to write config file")
    }

    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Failed to get home directory")?;
        Ok(home.join(".ema-extract"))
    }

    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.json"))
    }

    /// Generation settings derived from this config
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model: self.model.clone(),
            thinking_budget: self.thinking_budget,
            timeout: Duration::from_secs(self.timeout_secs),
            ..GenerationConfig::default()
        }
    }
}

/// How results are printed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Formatted details as collapsible sections
    #[default]
    Outline,
    /// Generic key/value tree
    Tree,
    /// Pretty-printed JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "outline" => Ok(Self::Outline),
            "tree" => Ok(Self::Tree),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, 1);
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.thinking_budget, Some(2500));
        assert_eq!(config.default_format, OutputFormat::Outline);
    }

    #[test]
    fn test_load_missing_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            model: "gemini-2.5-pro".into(),
            thinking_budget: None,
            default_format: OutputFormat::Json,
            ..Config::default()
        };
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"model": "gemini-2.5-pro"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.thinking_budget, Some(2500));
        assert_eq!(config.timeout_secs, 300);
    }

    #[test]
    fn test_generation_config() {
        let config = Config {
            thinking_budget: None,
            timeout_secs: 30,
            ..Config::default()
        };
        let generation = config.generation_config();
        assert_eq!(generation.temperature, 0.0);
        assert_eq!(generation.thinking_budget, None);
        assert_eq!(generation.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("outline".parse::<OutputFormat>().unwrap(), OutputFormat::Outline);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
