//! Configuration schema types
//!
//! This module defines the configuration structure that maps to the
//! `docferry.toml` file.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::errors::FerryError;

/// Main docferry configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FerryConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Named connections transfers are resolved against
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FerryConfig {
    /// Loads and validates a configuration file.
    ///
    /// Equivalent to [`crate::config::load_config`]; see that function for
    /// the substitution and override rules applied along the way.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::Configuration`] if the file cannot be read,
    /// parsed, or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FerryError> {
        super::loader::load_config(path)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;

        if self.connections.is_empty() {
            return Err(
                "at least one connection must be declared under [connections]".to_string(),
            );
        }
        for (name, connection) in &self.connections {
            if name.trim().is_empty() {
                return Err("connection names cannot be empty".to_string());
            }
            connection.validate(name)?;
        }

        self.logging.validate()?;
        Ok(())
    }

    /// Looks up a declared connection by name.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::UnknownConnection`] if no connection with that
    /// name is declared.
    pub fn connection(&self, name: &str) -> Result<&ConnectionConfig, FerryError> {
        self.connections
            .get(name)
            .ok_or_else(|| FerryError::UnknownConnection(name.to_string()))
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (read and report, but never write to the target)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// A named store connection
///
/// Declared as `[connections.<name>]` tables with a `kind` discriminator:
///
/// ```toml
/// [connections.archive]
/// kind = "jsonl"
/// root = "./data"
///
/// [connections.scratch]
/// kind = "memory"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConnectionConfig {
    /// JSON Lines files under a root directory
    Jsonl {
        /// Directory that holds `<database>/<collection>.jsonl` files
        root: String,
    },
    /// In-process store, shared by connection name within a run
    Memory,
}

impl ConnectionConfig {
    /// Returns the `kind` discriminator as written in TOML.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionConfig::Jsonl { .. } => "jsonl",
            ConnectionConfig::Memory => "memory",
        }
    }

    fn validate(&self, name: &str) -> Result<(), String> {
        match self {
            ConnectionConfig::Jsonl { root } => {
                if root.trim().is_empty() {
                    return Err(format!(
                        "connections.{name}.root cannot be empty for kind = 'jsonl'"
                    ));
                }
            }
            ConnectionConfig::Memory => {}
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable JSON file logging alongside the console
    #[serde(default)]
    pub file_enabled: bool,

    /// Directory log files are written to
    #[serde(default = "default_file_directory")]
    pub file_directory: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_file_rotation")]
    pub file_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.file_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.file_rotation '{}'. Must be one of: {}",
                self.file_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.file_enabled && self.file_directory.trim().is_empty() {
            return Err("logging.file_directory cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_enabled: false,
            file_directory: default_file_directory(),
            file_rotation: default_file_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_file_directory() -> String {
    "logs".to_string()
}

fn default_file_rotation() -> String {
    "daily".to_string()
}
