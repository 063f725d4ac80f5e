use crate::errors::{CompletionError, CompletionResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Credential value shipped in example configs; treated as absent.
pub const API_KEY_PLACEHOLDER: &str = "PASTE_YOUR_API_KEY_HERE";

/// Artificial latency applied by the echo-style simulated reply
pub const DEFAULT_SIMULATED_DELAY_MS: u64 = 1500;

/// What the gateway answers when no usable credential is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimulatedStyle {
    /// Echo the user's text in a guest-mode message, after an artificial delay
    #[default]
    EchoWithDelay,
    /// Immediately return a fixed configuration-error notice, no echo
    ConfigurationNotice,
}

/// What the gateway answers when a live call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStyle {
    /// Apology message that echoes the user's text back
    #[default]
    Echo,
    /// Fixed apology with no echo
    Generic,
}

/// Configuration struct for the completion gateway
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub system_prompt: Option<String>,
    pub model_name: Option<String>,
    pub simulated_style: Option<SimulatedStyle>,
    pub fallback_style: Option<FallbackStyle>,
    pub simulated_delay_ms: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            system_prompt: Some(
                "You are a helpful assistant. Answer the user's questions concisely and accurately."
                .to_string()
            ),
            model_name: Some(crate::types::DEFAULT_MODEL.to_string()),
            simulated_style: Some(SimulatedStyle::EchoWithDelay),
            fallback_style: Some(FallbackStyle::Echo),
            simulated_delay_ms: Some(DEFAULT_SIMULATED_DELAY_MS),
        }
    }
}

impl GatewayConfig {
    /// True when a credential is present and is not the known placeholder.
    /// This is the sole switch between Live and Simulated modes.
    pub fn has_usable_api_key(&self) -> bool {
        match self.api_key.as_deref() {
            Some(key) => !key.is_empty() && !key.contains(API_KEY_PLACEHOLDER),
            None => false,
        }
    }

    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> CompletionResult<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                CompletionError::Configuration(format!("Failed to read config file: {}", e))
            })?;

            let config: Self = toml::from_str(&content).map_err(|e| {
                CompletionError::Configuration(format!("Failed to parse config file: {}", e))
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> CompletionResult<()> {
        let content = toml::to_string(self).map_err(|e| {
            CompletionError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        // Ensure the directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CompletionError::Configuration(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            CompletionError::Configuration(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            api_key: other.api_key.clone().or_else(|| self.api_key.clone()),
            system_prompt: other
                .system_prompt
                .clone()
                .or_else(|| self.system_prompt.clone()),
            model_name: other.model_name.clone().or_else(|| self.model_name.clone()),
            simulated_style: other.simulated_style.or(self.simulated_style),
            fallback_style: other.fallback_style.or(self.fallback_style),
            simulated_delay_ms: other.simulated_delay_ms.or(self.simulated_delay_ms),
        }
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> CompletionResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        CompletionError::Configuration("Could not determine home directory".to_string())
    })?;

    let config_dir = home_dir.join(".config").join(app_name);

    Ok(config_dir)
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> CompletionResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}
