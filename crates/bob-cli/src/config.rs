//! CLI configuration
//!
//! Loaded from a TOML file, then overridden by `BOB_*` environment
//! variables, then validated. A missing file yields the defaults.

use bob_core::effects::TxTimestamp;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Log levels accepted in `log_level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Environment variable prefix
pub const ENV_PREFIX: &str = "BOB_";

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// File exists but could not be read
    #[error("Failed to read config file {path}: {message}")]
    Read {
        /// Config file
        path: PathBuf,
        /// Underlying error
        message: String,
    },

    /// File is not valid TOML for [`CliConfig`]
    #[error("Failed to parse config file {path}: {message}")]
    Parse {
        /// Config file
        path: PathBuf,
        /// Underlying error
        message: String,
    },

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for one CLI run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding `token.json` and `escrow.json`
    pub data_dir: PathBuf,
    /// Default tracing filter
    pub log_level: String,
    /// Caller identity hint; empty means unresolvable
    pub identity: String,
    /// Fixed RFC 3339 transaction timestamp; wall clock when unset
    pub timestamp: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".bob/data"),
            log_level: "info".to_string(),
            identity: "Org1MSP".to_string(),
            timestamp: None,
        }
    }
}

impl CliConfig {
    /// Load, apply the process environment, and validate.
    pub fn resolve(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.merge_with_env();
        config.validate()?;
        Ok(config)
    }

    /// Read `path`, or defaults if it does not exist.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply `BOB_*` variables from the process environment.
    pub fn merge_with_env(&mut self) {
        self.merge_with_vars(std::env::vars());
    }

    /// Apply `BOB_*` entries from `vars`; other entries are ignored.
    pub fn merge_with_vars(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "DATA_DIR" => self.data_dir = PathBuf::from(value),
                "LOG_LEVEL" => self.log_level = value,
                "IDENTITY" => self.identity = value,
                "TIMESTAMP" => self.timestamp = Some(value).filter(|v| !v.is_empty()),
                _ => {}
            }
        }
    }

    /// Check every value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir cannot be empty".to_string()));
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log_level {:?}, expected one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }
        self.fixed_timestamp()?;
        Ok(())
    }

    /// Configured timestamp, parsed.
    pub fn fixed_timestamp(&self) -> Result<Option<TxTimestamp>, ConfigError> {
        self.timestamp
            .as_deref()
            .map(|raw| {
                chrono::DateTime::parse_from_rfc3339(raw)
                    .map(|ts| ts.with_timezone(&chrono::Utc))
                    .map_err(|e| ConfigError::Invalid(format!("timestamp {raw:?}: {e}")))
            })
            .transpose()
    }

    /// Token ledger snapshot file
    pub fn token_state_path(&self) -> PathBuf {
        self.data_dir.join("token.json")
    }

    /// Escrow snapshot file
    pub fn escrow_state_path(&self) -> PathBuf {
        self.data_dir.join("escrow.json")
    }
}
