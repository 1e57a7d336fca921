//! Configuration management for query-batch.
//!
//! Handles loading configuration from a TOML file and environment variables.
//! Command-line arguments take precedence over both.

use crate::error::{BatchError, Result};
use crate::output::OutputFormat;
use crate::query::OnError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the database file.
pub const DATABASE_ENV: &str = "QBATCH_DATABASE";

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the data comes from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// SQLite database file.
    pub path: Option<PathBuf>,
}

impl SourceConfig {
    /// Fills in the database path from `QBATCH_DATABASE` if none is set.
    pub fn apply_env_defaults(&mut self) {
        if self.path.is_none() {
            self.path = std::env::var_os(DATABASE_ENV).map(PathBuf::from);
        }
    }
}

/// Batch execution settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Failure policy for individual queries.
    #[serde(default)]
    pub on_error: OnError,
}

/// Rendering settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("query-batch")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| BatchError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            BatchError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}
