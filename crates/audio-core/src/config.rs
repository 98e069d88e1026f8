//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. Environment variables
//! 2. `audio-client.toml` in the working directory
//! 3. Defaults
//!
//! `${VAR_NAME}` references inside the TOML file are expanded from the
//! environment before parsing.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::{Error, Result};

/// Default config file name looked up by [`AudioConfig::load`]
pub const CONFIG_FILE: &str = "audio-client.toml";

/// REST endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the audio API (e.g. `http://localhost:8080/api/v1/audio`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
        }
    }
}

/// Real-time transcription handshake settings
///
/// The speech credential and region have no defaults; they must be
/// supplied by the caller.
#[derive(Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Speech service credential sent in the `init` frame
    pub api_key: Option<String>,

    /// Speech service region
    pub region: Option<String>,

    /// Recognition language tag
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            region: None,
            language: default_language(),
        }
    }
}

impl std::fmt::Debug for StreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("language", &self.language)
            .finish()
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api/v1/audio".to_string()
}

fn default_language() -> String {
    "nl-NL".to_string()
}

/// Main configuration for the audio client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Streaming transcription configuration
    #[serde(default)]
    pub stream: StreamConfig,
}

impl AudioConfig {
    /// Replace `${VAR_NAME}` with the value of the environment variable.
    ///
    /// Unset variables expand to an empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file
    ///
    /// Environment variables take precedence over values in the file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut cfg = Self::from_toml_str(&toml_content)?;
        cfg.apply_env_overrides();

        debug!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    /// Parse configuration from TOML text, expanding `${VAR}` references
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let expanded = Self::expand_env_vars(content);

        toml::from_str(&expanded).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load from `./audio-client.toml`, falling back to the environment only
    pub fn load() -> Result<Self> {
        if Path::new(CONFIG_FILE).exists() {
            return Self::from_toml_file(CONFIG_FILE);
        }

        Ok(Self::from_env())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg
    }

    fn apply_env_overrides(&mut self) {
        if let Some(url) = non_empty_var("AUDIO_API_BASE_URL") {
            self.api.base_url = url;
        }
        if let Some(token) = non_empty_var("AUDIO_API_TOKEN") {
            self.api.token = Some(token);
        }

        if let Some(key) = non_empty_var("SPEECH_API_KEY") {
            self.stream.api_key = Some(key);
        }
        if let Some(region) = non_empty_var("SPEECH_REGION") {
            self.stream.region = Some(region);
        }
        if let Some(language) = non_empty_var("SPEECH_LANGUAGE") {
            self.stream.language = language;
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
