//! # Bot Configuration Module
//!
//! Configuration is read from environment variables (optionally loaded from a
//! `.env` file by `main`). Every optional setting has a default constant.

use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::generation::DEFAULT_SYSTEM_ROLE;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GENERATION_DELAY_SECS: u64 = 3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}: expected {expected}")]
    InvalidValue {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Settings of the OpenAI-compatible generator
#[derive(Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Timeout of a single completion request in seconds
    pub request_timeout_secs: u64,
}

impl OpenAiConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &mask_secret(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Generation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    /// Delay before a scheduled generation runs, in seconds
    pub delay_secs: u64,
    /// System role passed to the generator
    pub system_role: String,
    /// `None` selects the template fallback
    pub openai: Option<OpenAiConfig>,
}

impl GenerationConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            delay_secs: DEFAULT_GENERATION_DELAY_SECS,
            system_role: DEFAULT_SYSTEM_ROLE.to_string(),
            openai: None,
        }
    }
}

/// Complete bot configuration
#[derive(Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub telegram_token: String,
    pub generation: GenerationConfig,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("telegram_token", &mask_secret(&self.telegram_token))
            .field("generation", &self.generation)
            .finish()
    }
}

impl BotConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let telegram_token = get("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let delay_secs = match get("GENERATION_DELAY_SECS") {
            Some(value) => parse_secs("GENERATION_DELAY_SECS", value)?,
            None => DEFAULT_GENERATION_DELAY_SECS,
        };

        let openai = match get("OPENAI_API_KEY") {
            Some(api_key) => {
                let request_timeout_secs = match get("GENERATION_TIMEOUT_SECS") {
                    Some(value) => parse_secs("GENERATION_TIMEOUT_SECS", value)?,
                    None => DEFAULT_REQUEST_TIMEOUT_SECS,
                };
                if request_timeout_secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        name: "GENERATION_TIMEOUT_SECS",
                        value: "0".to_string(),
                        expected: "a positive number of seconds",
                    });
                }

                Some(OpenAiConfig {
                    api_key,
                    model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                    base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                    request_timeout_secs,
                })
            }
            None => None,
        };

        Ok(Self {
            telegram_token,
            generation: GenerationConfig {
                delay_secs,
                system_role: get("SYSTEM_ROLE").unwrap_or_else(|| DEFAULT_SYSTEM_ROLE.to_string()),
                openai,
            },
        })
    }
}

fn parse_secs(name: &'static str, value: String) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value,
        expected: "a whole number of seconds",
    })
}

/// Mask a secret for logging: first 7 + "***" + last 4 characters.
/// Secrets of 11 characters or fewer are fully masked.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}***{tail}")
}
