//! Logger configuration.

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::severity::Severity;

/// Deployment environment, decided by an external configuration loader.
///
/// Only `"dev"` (matched case-insensitively) selects the development
/// environment; every other value is treated as production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Environment {
    Dev,
    #[default]
    Production,
}

impl Environment {
    /// Parse an environment string; anything other than `"dev"` is production.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("dev") {
            Environment::Dev
        } else {
            Environment::Production
        }
    }

    /// Check whether this is the development environment
    pub fn is_dev(&self) -> bool {
        matches!(self, Environment::Dev)
    }
}

impl FromStr for Environment {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Environment::parse(s))
    }
}

impl From<&str> for Environment {
    fn from(s: &str) -> Self {
        Environment::parse(s)
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        Environment::parse(&s)
    }
}

/// Logger configuration
///
/// Constructed once at startup and immutable afterwards. The environment and
/// log directory come from external configuration; the minimum severity is a
/// runtime parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    /// Deployment environment selecting the output sink and encoding
    #[serde(default)]
    pub environment: Environment,

    /// Directory for daily log files
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,

    /// Minimum severity for emitted records (default: info)
    #[serde(default)]
    pub level: Severity,
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            log_directory: default_log_directory(),
            level: Severity::default(),
        }
    }
}

impl LoggerConfig {
    /// Build a configuration from raw strings, applying the forgiving
    /// environment and severity parsing.
    pub fn new(environment: &str, log_directory: impl Into<PathBuf>, level: &str) -> Self {
        Self {
            environment: Environment::parse(environment),
            log_directory: log_directory.into(),
            level: Severity::parse(level),
        }
    }

    /// Load configuration from a TOML file, or return defaults if not found
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }
}
