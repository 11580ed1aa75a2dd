//! Batch configuration, read from an optional `momo.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::policy::{DatePolicy, ValidationPolicy};

pub const DEFAULT_CONFIG_FILE: &str = "momo.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file.
    pub database: PathBuf,
    /// Append-only log of rejected messages.
    pub rejection_log: PathBuf,
    /// Custom rule table; the built-in table is used when unset.
    pub rules: Option<PathBuf>,
    pub validation: ValidationPolicy,
    pub date_policy: DatePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("transactions.db"),
            rejection_log: PathBuf::from("unprocessed_sms.log"),
            rules: None,
            validation: ValidationPolicy::default(),
            date_policy: DatePolicy::default(),
        }
    }
}

impl Config {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_content)?)
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
