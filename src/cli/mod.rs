//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for docferry using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// docferry - Document Collection Copy Tool
#[derive(Parser, Debug)]
#[command(name = "docferry")]
#[command(version, about, long_about = None)]
#[command(author = "docferry Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "docferry.toml", env = "DOCFERRY_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DOCFERRY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy a collection from one connection to another
    Copy(commands::copy::CopyArgs),

    /// Count the documents in a collection
    Count(commands::count::CountArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transfer::ConflictPolicy;

    fn copy_argv() -> Vec<&'static str> {
        vec![
            "docferry",
            "copy",
            "--source-connection",
            "archive",
            "--source-database",
            "appdb",
            "--source-collection",
            "users",
            "--target-connection",
            "backup",
            "--target-database",
            "appdb",
            "--target-collection",
            "users",
        ]
    }

    #[test]
    fn test_cli_parse_copy() {
        let cli = Cli::parse_from(copy_argv());
        assert_eq!(cli.config, "docferry.toml");
        match cli.command {
            Commands::Copy(args) => {
                assert_eq!(args.source_connection, "archive");
                assert_eq!(args.policy, ConflictPolicy::Abort);
                assert!(!args.dry_run);
            }
            other => panic!("expected copy command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_copy_with_policy() {
        let mut argv = copy_argv();
        argv.extend(["--policy", "generate-new-ids", "--yes"]);
        let cli = Cli::parse_from(argv);
        match cli.command {
            Commands::Copy(args) => {
                assert_eq!(args.policy, ConflictPolicy::GenerateNewIds);
                assert!(args.yes);
            }
            other => panic!("expected copy command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_policy() {
        let mut argv = copy_argv();
        argv.extend(["--policy", "merge"]);
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_cli_parse_with_config() {
        let mut argv = vec!["docferry", "--config", "custom.toml"];
        argv.extend(copy_argv().into_iter().skip(1));
        let cli = Cli::parse_from(argv);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_count() {
        let cli = Cli::parse_from([
            "docferry",
            "count",
            "--connection",
            "archive",
            "--database",
            "appdb",
            "--collection",
            "users",
        ]);
        assert!(matches!(cli.command, Commands::Count(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["docferry", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["docferry", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["docferry", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
