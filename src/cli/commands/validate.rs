//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the docferry configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Load configuration (validation runs as part of loading)
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!();
        println!("  Connections ({}):", config.connections.len());

        let mut names: Vec<_> = config.connections.keys().collect();
        names.sort();
        for name in names {
            match &config.connections[name] {
                crate::config::ConnectionConfig::Jsonl { root } => {
                    println!("    {name}: jsonl (root: {root})");
                }
                crate::config::ConnectionConfig::Memory => {
                    println!("    {name}: memory");
                }
            }
        }

        println!();
        println!("  File Logging: {}", config.logging.file_enabled);
        if config.logging.file_enabled {
            println!("  Log Directory: {}", config.logging.file_directory);
            println!("  Log Rotation: {}", config.logging.file_rotation);
        }
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_args_creation() {
        let args = ValidateArgs {};
        // Just ensure it compiles and can be created
        let _ = format!("{args:?}");
    }

    #[tokio::test]
    async fn test_validate_missing_config() {
        let args = ValidateArgs {};
        let exit = args.execute("no-such-docferry.toml").await.unwrap();
        assert_eq!(exit, 2);
    }
}
