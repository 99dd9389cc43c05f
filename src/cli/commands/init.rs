//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "docferry.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing docferry configuration");
        println!();

        // Check if file already exists
        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your connections", self.output);
                println!("  2. Validate configuration: docferry validate-config");
                println!("  3. Size a collection: docferry count --connection archive \\");
                println!("       --database appdb --collection users");
                println!("  4. Run a copy: docferry copy --source-connection archive \\");
                println!("       --source-database appdb --source-collection users \\");
                println!("       --target-connection backup --target-database appdb \\");
                println!("       --target-collection users --policy abort");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(1)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# docferry Configuration File
# Streaming copy engine for document collections

[application]
log_level = "info"
dry_run = false

[connections.archive]
kind = "jsonl"
root = "./data"

[connections.backup]
kind = "jsonl"
root = "./backup"

[logging]
file_enabled = false
file_directory = "logs"
file_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# docferry Configuration File
# Streaming copy engine for document collections
#
# This file contains all configuration options with examples and explanations.
#
# Transfers run between named connections declared under [connections].
# Each connection has a kind:
#   - jsonl:  collections stored as <root>/<database>/<collection>.jsonl
#   - memory: an in-process store, useful for rehearsing a copy

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Dry run mode (stream and report, but never write to the target)
dry_run = false

# ============================================================================
# Connections
# ============================================================================
# Declare every store a copy can read from or write to. Connection names
# are referenced by `docferry copy --source-connection <name> ...`.

[connections.archive]
kind = "jsonl"
# Directory that holds <database>/<collection>.jsonl files.
# Environment variables expand with ${VAR} syntax:
# root = "${DOCFERRY_DATA_ROOT}"
root = "./data"

[connections.backup]
kind = "jsonl"
root = "./backup"

# An in-process connection; data lives only for the duration of the run.
[connections.scratch]
kind = "memory"

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable JSON file logging alongside the console
file_enabled = false

# Directory log files are written to
file_directory = "logs"

# Log rotation (daily, hourly, never)
file_rotation = "daily"
"#
        .to_string()
    }
}
