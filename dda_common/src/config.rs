//! TOML configuration: loading, parsing and validation.
//!
//! Every DDA binary reads TOML through the [`ConfigLoader`] blanket trait and
//! checks semantic bounds through [`Validate`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use dda_common::config::{ConfigError, ConfigLoader};
//! use dda_common::stepper::config::StepperConfig;
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = StepperConfig::load_validated(Path::new("config/stepper.toml"))?;
//!     println!("{} motors", config.motors.len());
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading and validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// No file at the given path.
    #[error("config file not found")]
    FileNotFound,

    /// Unreadable file, bad TOML, or a document of the wrong shape.
    #[error("config parse error: {0}")]
    ParseError(String),

    /// Parsed, but a value is out of bounds or inconsistent.
    #[error("invalid config: {0}")]
    ValidationError(String),
}

/// Base tracing level, written lowercase in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-segment detail, including null loads.
    Trace,
    /// Stage transitions.
    Debug,
    /// Startup and summary output.
    #[default]
    Info,
    /// Rejected segments and protocol violations.
    Warn,
    /// Fatal errors only.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Common configuration fields shared across DDA binaries.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "dda-sim"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Base level; `-v` on the command line overrides it.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Name attached to log output.
    pub service_name: String,
}

impl Validate for SharedConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "shared.service_name is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Semantic validation applied after a configuration has been parsed.
pub trait Validate {
    /// Check parameter bounds and cross-field consistency.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// TOML loading for every deserializable type.
///
/// A missing file is `FileNotFound`; read and syntax errors are `ParseError`.
/// Only `load_validated` can return `ValidationError`.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Read and parse `path`.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from an in-memory TOML document.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load a configuration file and run its [`Validate`] checks.
    fn load_validated(path: &Path) -> Result<Self, ConfigError>
    where
        Self: Validate,
    {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
