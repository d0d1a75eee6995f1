//! Engine configuration
//!
//! Configuration is fixed when the manager is constructed and is not
//! renegotiated per call; `initialize()` takes no arguments. Values persist
//! as JSON in the platform data directory.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::LlmError;

/// Model artifact name expected under the models directory by default.
pub const DEFAULT_MODEL_FILE: &str = "Gemma3-1B-IT_multi-prefill-seq_q8_ekv2048.task";

/// Default token limit for a loaded engine.
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Default top-k ceiling handed to the engine.
pub const DEFAULT_MAX_TOP_K: u32 = 64;

/// Errors raised by configuration persistence.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access data directory: {0}")]
    DataDirError(String),
    #[error("Failed to read or write config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize/deserialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which compute backend the engine should prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    Gpu,
    Cpu,
}

/// Configuration for building the inference engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the model artifact. Must exist and be readable at
    /// initialization time.
    pub model_path: PathBuf,
    /// Preferred compute backend.
    pub backend_preference: BackendPreference,
    /// Maximum number of tokens the engine may generate.
    pub max_tokens: u32,
    /// Upper bound for top-k sampling inside the engine.
    pub max_top_k: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: get_data_dir()
                .ok()
                .map(|d| d.join("models").join(DEFAULT_MODEL_FILE))
                .unwrap_or_else(|| PathBuf::from("./models").join(DEFAULT_MODEL_FILE)),
            backend_preference: BackendPreference::Gpu,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_top_k: DEFAULT_MAX_TOP_K,
        }
    }
}

impl EngineConfig {
    /// Checks the configuration for values the engine would refuse.
    ///
    /// Path existence is deliberately not checked here; the artifact is
    /// validated at every initialization attempt instead.
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.max_tokens == 0 {
            return Err(LlmError::InvalidConfiguration(
                "max_tokens must be positive".to_string(),
            ));
        }
        if self.max_top_k == 0 {
            return Err(LlmError::InvalidConfiguration(
                "max_top_k must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads the persisted configuration, falling back to defaults if the
    /// file is missing or corrupted.
    pub fn load() -> Self {
        match Self::load_internal() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load engine config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn load_internal() -> Result<Self, ConfigError> {
        let path = get_config_path()?;

        if !path.exists() {
            tracing::info!("Engine config file not found, using defaults");
            return Ok(Self::default());
        }

        let json = fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&json)?;

        tracing::debug!("Loaded engine config from disk");
        Ok(config)
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = get_config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        tracing::debug!("Saved engine config to disk");
        Ok(())
    }
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf, ConfigError> {
    directories::ProjectDirs::from("com", "llmbridge", "LlmBridge")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| ConfigError::DataDirError("Could not determine data directory".to_string()))
}

fn get_config_path() -> Result<PathBuf, ConfigError> {
    Ok(get_data_dir()?.join("engine_config.json"))
}
