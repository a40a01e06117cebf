//! Configuration file management for Luna
//!
//! Values live in ~/.luna/config.toml. The API key and the memory/retrieval
//! sizes can be overridden by environment variables.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::env::{apis as env_apis, memory as env_memory};
use crate::error::{LunaError, Result};
use crate::memory::{MemoryConfig, TrimPolicy, MEMORY_LEN_DEFAULT};
use crate::services::llm::{GenerationSettings, GroqModel};
use crate::vector_store::TOP_K_DEFAULT;

/// Configuration structure matching config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub memory: MemorySection,
    #[serde(default)]
    pub retrieval: RetrievalSection,
    #[serde(default)]
    pub model: ModelSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySection {
    #[serde(default = "default_memory_len")]
    pub memory_len: usize,
    #[serde(default)]
    pub trim_policy: TrimPolicy,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            memory_len: MEMORY_LEN_DEFAULT,
            trim_policy: TrimPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalSection {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            top_k: TOP_K_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSection {
    #[serde(default)]
    pub name: GroqModel,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ModelSection {
    fn default() -> Self {
        let settings = GenerationSettings::default();
        Self {
            name: GroqModel::default(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            top_p: settings.top_p,
            api_key: None,
        }
    }
}

fn default_memory_len() -> usize {
    MEMORY_LEN_DEFAULT
}

fn default_top_k() -> usize {
    TOP_K_DEFAULT
}

fn default_temperature() -> f32 {
    GenerationSettings::default().temperature
}

fn default_max_tokens() -> u32 {
    GenerationSettings::default().max_tokens
}

fn default_top_p() -> f32 {
    GenerationSettings::default().top_p
}

/// Keys accepted by get/set/unset, in display order.
pub const CONFIG_KEYS: [&str; 8] = [
    "memory.memory-len",
    "memory.trim-policy",
    "retrieval.top-k",
    "model.name",
    "model.temperature",
    "model.max-tokens",
    "model.top-p",
    "model.api-key",
];

/// Accepts dotted or bare keys with either `-` or `_` separators.
fn normalize_key(key: &str) -> Option<&'static str> {
    let key = key.trim().to_lowercase().replace('_', "-");
    CONFIG_KEYS.into_iter().find(|candidate| {
        *candidate == key
            || candidate
                .split_once('.')
                .is_some_and(|(_, bare)| bare == key)
    })
}

fn unknown_key(key: &str) -> LunaError {
    LunaError::invalid_config(format!(
        "Unknown config key: {key}. Valid keys: {}",
        CONFIG_KEYS.join(", ")
    ))
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| LunaError::invalid_config(format!("Invalid value for {key}: {e}")))
}

impl Config {
    /// Get the config file path (~/.luna/config.toml)
    pub fn get_config_path() -> Result<PathBuf> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| LunaError::invalid_config("Could not find home directory"))?;
        Ok(home_dir.join(".luna").join("config.toml"))
    }

    /// Load configuration from the default path
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        // Owner read/write only; the file may hold an API key
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "Saved config file");
        Ok(())
    }

    /// Apply `LUNA_MEMORY_LEN` and `LUNA_TOP_K` on top of file values.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(value) = std::env::var(env_memory::MEMORY_LEN) {
            self.memory.memory_len = parse_value(env_memory::MEMORY_LEN, &value)?;
        }
        if let Ok(value) = std::env::var(env_memory::TOP_K) {
            self.retrieval.top_k = parse_value(env_memory::TOP_K, &value)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.memory_config().validate()?;
        if self.retrieval.top_k == 0 {
            return Err(LunaError::invalid_config("top_k must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(LunaError::invalid_config(
                "temperature must be between 0.0 and 2.0",
            ));
        }
        if !(0.0..=1.0).contains(&self.model.top_p) || self.model.top_p == 0.0 {
            return Err(LunaError::invalid_config(
                "top_p must be in the range (0.0, 1.0]",
            ));
        }
        if self.model.max_tokens == 0 {
            return Err(LunaError::invalid_config("max_tokens must be at least 1"));
        }
        Ok(())
    }

    pub fn memory_config(&self) -> MemoryConfig {
        MemoryConfig::new(self.memory.memory_len).with_trim_policy(self.memory.trim_policy)
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.model.temperature,
            max_tokens: self.model.max_tokens,
            top_p: self.model.top_p,
        }
    }

    /// Get a config value by key
    pub fn get(&self, key: &str) -> Option<String> {
        match normalize_key(key)? {
            "memory.memory-len" => Some(self.memory.memory_len.to_string()),
            "memory.trim-policy" => Some(self.memory.trim_policy.to_string()),
            "retrieval.top-k" => Some(self.retrieval.top_k.to_string()),
            "model.name" => Some(self.model.name.to_string()),
            "model.temperature" => Some(self.model.temperature.to_string()),
            "model.max-tokens" => Some(self.model.max_tokens.to_string()),
            "model.top-p" => Some(self.model.top_p.to_string()),
            "model.api-key" => self.model.api_key.clone(),
            _ => None,
        }
    }

    /// Set a config value by key. The value is parsed and the whole config
    /// re-validated; on error nothing changes.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let canonical = normalize_key(key).ok_or_else(|| unknown_key(key))?;
        let mut updated = self.clone();

        match canonical {
            "memory.memory-len" => updated.memory.memory_len = parse_value(canonical, value)?,
            "memory.trim-policy" => updated.memory.trim_policy = parse_value(canonical, value)?,
            "retrieval.top-k" => updated.retrieval.top_k = parse_value(canonical, value)?,
            "model.name" => updated.model.name = parse_value(canonical, value)?,
            "model.temperature" => updated.model.temperature = parse_value(canonical, value)?,
            "model.max-tokens" => updated.model.max_tokens = parse_value(canonical, value)?,
            "model.top-p" => updated.model.top_p = parse_value(canonical, value)?,
            "model.api-key" => updated.model.api_key = Some(value.trim().to_string()),
            _ => return Err(unknown_key(key)),
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Reset a config value to its default
    pub fn unset(&mut self, key: &str) -> Result<()> {
        let defaults = Config::default();
        match normalize_key(key).ok_or_else(|| unknown_key(key))? {
            "memory.memory-len" => self.memory.memory_len = defaults.memory.memory_len,
            "memory.trim-policy" => self.memory.trim_policy = defaults.memory.trim_policy,
            "retrieval.top-k" => self.retrieval.top_k = defaults.retrieval.top_k,
            "model.name" => self.model.name = defaults.model.name,
            "model.temperature" => self.model.temperature = defaults.model.temperature,
            "model.max-tokens" => self.model.max_tokens = defaults.model.max_tokens,
            "model.top-p" => self.model.top_p = defaults.model.top_p,
            "model.api-key" => self.model.api_key = None,
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// Get all config values as key-value pairs, secrets masked
    pub fn list(&self) -> Vec<(String, String)> {
        CONFIG_KEYS
            .into_iter()
            .filter_map(|key| {
                let value = self.get(key)?;
                let value = if key == "model.api-key" {
                    mask_api_key(&value)
                } else {
                    value
                };
                Some((key.to_string(), value))
            })
            .collect()
    }
}

/// Get Groq API key with priority: environment variable > config file
pub fn get_groq_api_key() -> Result<Option<String>> {
    if let Ok(key) = std::env::var(env_apis::GROQ_API_KEY) {
        if !key.is_empty() {
            return Ok(Some(key));
        }
    }

    let config = Config::load()?;
    Ok(config.model.api_key.filter(|key| !key.is_empty()))
}

pub fn has_groq_api_key() -> bool {
    get_groq_api_key().ok().flatten().is_some()
}

/// Mask API key for display (show first 4 and last 4 characters)
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
