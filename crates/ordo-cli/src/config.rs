//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for ordo
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model id to use
    pub model: Option<String>,
    /// Base URL for an OpenAI-compatible endpoint
    pub base_url: Option<String>,
    /// Board database id
    pub database_id: Option<String>,
    /// Maximum assistant turns per user input
    pub max_turns: Option<usize>,
    /// Maximum task-ops steps per delegation
    pub task_ops_max_steps: Option<usize>,
    /// Keep conversation history across turns (false restores the legacy
    /// reset-on-input behavior)
    pub persist_history: Option<bool>,
    /// API keys (alternative to environment variables)
    #[serde(default)]
    pub api_keys: ApiKeys,
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub notion: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ordo")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for ORDO_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("ORDO_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        let dir = path.parent().unwrap();
        fs::create_dir_all(dir)?;

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            model: Some("gpt-4o-mini".to_string()),
            max_turns: Some(10),
            persist_history: Some(true),
            ..Default::default()
        };

        default_config.save()?;
        Ok(path)
    }

    /// Get the OpenAI API key, checking config then env
    pub fn openai_api_key(&self) -> Option<String> {
        self.api_keys
            .openai
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }

    /// Get the board API key, checking config then env
    pub fn notion_api_key(&self) -> Option<String> {
        self.api_keys
            .notion
            .clone()
            .or_else(|| std::env::var("NOTION_API_KEY").ok())
    }
}
