//! CLI configuration file support.
//!
//! Configuration precedence:
//! 1. CLI arguments (handled by clap)
//! 2. Local config file (./.dbcfgrc)
//! 3. Global config file (~/.dbcfg/config.toml)
//! 4. Defaults

use dbnet_config::OrderPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// CLI configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Directory dataset paths are resolved against
    #[serde(default)]
    pub base_dir: Option<String>,

    /// Pipeline ordering policy (enforce, ignore)
    #[serde(default)]
    pub order_policy: Option<OrderPolicy>,

    /// Check that dataset and checkpoint paths exist
    #[serde(default)]
    pub check_paths: Option<bool>,

    /// Log level
    #[serde(default)]
    pub log_level: Option<String>,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output format configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Document format for `show` (toml, json, yaml)
    #[serde(default = "default_show_format")]
    pub show_format: String,

    /// Always use JSON output
    #[serde(default)]
    pub always_json: bool,
}

fn default_show_format() -> String {
    "toml".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            show_format: default_show_format(),
            always_json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum CliConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),
}

pub type CliConfigResult<T> = std::result::Result<T, CliConfigError>;

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> CliConfigResult<Self> {
        if !path.exists() {
            return Err(CliConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| CliConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| CliConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".dbcfg")
            .join("config.toml")
    }

    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".dbcfgrc")
    }

    /// Load the global config, then the local one on top of it.
    ///
    /// Missing files are skipped; unreadable ones are logged and skipped.
    pub fn discover_and_load() -> Self {
        let mut config = Self::default();

        for path in [Self::default_global_path(), Self::default_local_path()] {
            match Self::load_from_file(&path) {
                Ok(found) => {
                    tracing::debug!(path = %path.display(), "Loaded CLI config");
                    config.merge(&found);
                }
                Err(CliConfigError::NotFound(_)) => {}
                Err(e) => tracing::warn!(error = %e, "Ignoring CLI config"),
            }
        }

        config
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &Self) {
        if let Some(ref base_dir) = other.base_dir {
            self.base_dir = Some(base_dir.clone());
        }
        if let Some(policy) = other.order_policy {
            self.order_policy = Some(policy);
        }
        if let Some(check) = other.check_paths {
            self.check_paths = Some(check);
        }
        if let Some(ref log_level) = other.log_level {
            self.log_level = Some(log_level.clone());
        }
        if other.output.always_json {
            self.output.always_json = true;
        }
        if other.output.show_format != default_show_format() {
            self.output.show_format = other.output.show_format.clone();
        }
    }
}
