//! Configuration management for tripsmith
//!
//! Loads and saves gateway, agent and toolkit settings from a JSON file,
//! falling back to environment variables for credentials.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, data_dir, plans_dir};

/// Environment variable consulted when `provider.api_key` is empty
pub const ENV_LLM_API_KEY: &str = "LLM_API_KEY";
/// Environment variable consulted when `provider.api_base` is unset
pub const ENV_LLM_BASE_URL: &str = "LLM_BASE_URL";
/// Environment variable consulted when `provider.model` is empty
pub const ENV_LLM_MODEL_ID: &str = "LLM_MODEL_ID";
/// Environment variable consulted when `toolkit.amap.api_key` is empty
pub const ENV_AMAP_API_KEY: &str = "AMAP_API_KEY";
/// Environment variable consulted when `toolkit.unsplash.access_key` is empty
pub const ENV_UNSPLASH_ACCESS_KEY: &str = "UNSPLASH_ACCESS_KEY";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Completion gateway settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default)]
    pub model: String,
}

/// Generation and loop settings shared by every agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefaults {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_iterations: default_max_iterations(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_iterations() -> u32 {
    5
}

fn default_request_timeout() -> u64 {
    60
}

/// Map service toolkit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmapConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_amap_base")]
    pub api_base: String,
    #[serde(default = "default_amap_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for AmapConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_amap_base(),
            request_timeout_secs: default_amap_timeout(),
        }
    }
}

fn default_amap_base() -> String {
    "https://restapi.amap.com".to_string()
}

fn default_amap_timeout() -> u64 {
    10
}

/// Photo search toolkit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsplashConfig {
    #[serde(default)]
    pub access_key: String,
    #[serde(default = "default_unsplash_base")]
    pub api_base: String,
    #[serde(default = "default_unsplash_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for UnsplashConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            api_base: default_unsplash_base(),
            request_timeout_secs: default_unsplash_timeout(),
        }
    }
}

fn default_unsplash_base() -> String {
    "https://api.unsplash.com".to_string()
}

fn default_unsplash_timeout() -> u64 {
    10
}

/// Toolkit configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolkitConfig {
    #[serde(default)]
    pub amap: AmapConfig,
    #[serde(default)]
    pub unsplash: UnsplashConfig,
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub agent: AgentDefaults,
    #[serde(default)]
    pub toolkit: ToolkitConfig,
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn from_env(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|v| non_empty(&v))
}

impl Config {
    /// Load from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from a specific location, defaults when the file is absent
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("reading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to a specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("writing config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Gateway API key, config first then `LLM_API_KEY`
    pub fn api_key(&self) -> Option<String> {
        non_empty(&self.provider.api_key).or_else(|| from_env(ENV_LLM_API_KEY))
    }

    /// Gateway base URL, config first then `LLM_BASE_URL`
    pub fn api_base(&self) -> Option<String> {
        self.provider
            .api_base
            .as_deref()
            .and_then(non_empty)
            .or_else(|| from_env(ENV_LLM_BASE_URL))
    }

    /// Model id, config first then `LLM_MODEL_ID`
    pub fn model(&self) -> Option<String> {
        non_empty(&self.provider.model).or_else(|| from_env(ENV_LLM_MODEL_ID))
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    /// Map service key, config first then `AMAP_API_KEY`
    pub fn amap_api_key(&self) -> Option<String> {
        non_empty(&self.toolkit.amap.api_key).or_else(|| from_env(ENV_AMAP_API_KEY))
    }

    /// Photo service key, config first then `UNSPLASH_ACCESS_KEY`
    pub fn unsplash_access_key(&self) -> Option<String> {
        non_empty(&self.toolkit.unsplash.access_key).or_else(|| from_env(ENV_UNSPLASH_ACCESS_KEY))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.request_timeout_secs)
    }

    pub fn amap_timeout(&self) -> Duration {
        Duration::from_secs(self.toolkit.amap.request_timeout_secs)
    }

    pub fn unsplash_timeout(&self) -> Duration {
        Duration::from_secs(self.toolkit.unsplash.request_timeout_secs)
    }
}

/// Write a default config unless one exists, then load it
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        warn!("config already exists at {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("wrote default config to {:?}", config_path);
    }

    let plans = plans_dir();
    tokio::fs::create_dir_all(&plans).await?;
    info!("plan directory ready at {:?}", plans);

    Config::load().await
}
