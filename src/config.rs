use crate::error::{Error, Result};
use crate::llm::Provider;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: Provider,
    /// Candidate models, tried in order. Empty means the provider's defaults.
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            models: Vec::new(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            api_key_env: None,
            base_url: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// API key read from the environment. `Debug` never prints the secret.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn from_env(var: &str) -> Result<Self> {
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(Self(key.trim().to_string())),
            _ => Err(Error::config(format!(
                "{var} not set. Export it or add it to .env"
            ))),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(3).collect();
        write!(f, "Credential({prefix}***)")
    }
}

impl LlmConfig {
    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.provider.default_api_key_env())
    }

    pub fn credential(&self) -> Result<Credential> {
        Credential::from_env(self.api_key_env())
    }

    /// Configured models, or the provider's defaults when none are listed.
    pub fn candidates(&self) -> Vec<String> {
        if self.models.is_empty() {
            self.provider
                .default_models()
                .iter()
                .map(|m| m.to_string())
                .collect()
        } else {
            self.models.clone()
        }
    }
}

// Defaults
fn default_max_tokens() -> u32 {
    2500
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    180
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8501
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| Error::config(format!("Failed to parse config: {e}")))
    }

    /// Missing file means defaults; a file that exists but fails to parse is
    /// still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.llm.models.iter().any(|m| m.trim().is_empty()) {
            return Err(Error::config("llm.models contains a blank model name"));
        }
        if self.llm.max_tokens == 0 {
            return Err(Error::config("llm.max_tokens must be positive"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::config("llm.temperature must be between 0.0 and 2.0"));
        }
        Ok(())
    }
}
