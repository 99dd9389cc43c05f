//! Configuration management for docferry.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! docferry uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for optional settings
//! - Comprehensive validation
//! - Type-safe configuration structs
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use docferry::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration from file
//! let config = load_config("docferry.toml")?;
//!
//! // Resolve a declared connection
//! let archive = config.connection("archive")?;
//! println!("archive is a {} connection", archive.kind());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! The configuration is organized into sections:
//!
//! - [`ApplicationConfig`] - Application settings (log level, dry run)
//! - [`ConnectionConfig`] - Named store connections transfers run between
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [connections.archive]
//! kind = "jsonl"
//! root = "${DOCFERRY_DATA_ROOT}"
//!
//! [connections.scratch]
//! kind = "memory"
//!
//! [logging]
//! file_enabled = true
//! file_directory = "logs"
//! ```
//!
//! # Environment Variables
//!
//! Use `${VAR_NAME}` syntax for environment variable substitution, and
//! `DOCFERRY_<SECTION>_<KEY>` variables to override scalar settings:
//!
//! ```bash
//! export DOCFERRY_DATA_ROOT="/srv/ferry/data"
//! export DOCFERRY_APPLICATION_LOG_LEVEL="debug"
//! ```
//!
//! # Validation
//!
//! Configuration is validated on load:
//!
//! ```rust,no_run
//! use docferry::config::load_config;
//!
//! # fn example() {
//! match load_config("docferry.toml") {
//!     Ok(config) => println!("Configuration valid"),
//!     Err(e) => eprintln!("Configuration error: {}", e),
//! }
//! # }
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{ApplicationConfig, ConnectionConfig, FerryConfig, LoggingConfig};
