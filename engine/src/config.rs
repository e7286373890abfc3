//! Engine configuration with TOML file support.

use std::path::Path;

use ballot_types::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for an [`ElectionEngine`](crate::ElectionEngine).
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ledger account that holds staked tokens.
    #[serde(default = "default_custody")]
    pub custody: Address,

    /// Maximum number of candidates per election.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Maximum length in bytes of an election title.
    #[serde(default = "default_max_title_len")]
    pub max_title_len: usize,

    /// Maximum length in bytes of election and candidate descriptions.
    #[serde(default = "default_max_description_len")]
    pub max_description_len: usize,

    /// Maximum length in bytes of a candidate display name.
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_custody() -> Address {
    Address::new("ballot_custody")
}

fn default_max_candidates() -> usize {
    256
}

fn default_max_title_len() -> usize {
    200
}

fn default_max_description_len() -> usize {
    4096
}

fn default_max_name_len() -> usize {
    100
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.custody.is_valid() {
            return Err(ConfigError::Invalid("custody address must not be empty".into()));
        }
        if self.max_candidates == 0 {
            return Err(ConfigError::Invalid("max_candidates must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            custody: default_custody(),
            max_candidates: default_max_candidates(),
            max_title_len: default_max_title_len(),
            max_description_len: default_max_description_len(),
            max_name_len: default_max_name_len(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
