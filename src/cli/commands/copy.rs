//! Copy command implementation
//!
//! This module implements the `copy` command for streaming a document
//! collection from one declared connection to another.

use std::sync::Arc;

use clap::Args;
use tokio::sync::watch;

use crate::adapters::StoreFactory;
use crate::config::load_config;
use crate::core::transfer::{ConflictPolicy, ProgressSink, TransferRequest, TransferTask};
use crate::domain::CollectionRef;

/// Arguments for the copy command
#[derive(Args, Debug)]
pub struct CopyArgs {
    /// Source connection name (declared under `[connections]`)
    #[arg(long, value_name = "NAME")]
    pub source_connection: String,

    /// Source database name
    #[arg(long, value_name = "DATABASE")]
    pub source_database: String,

    /// Source collection name
    #[arg(long, value_name = "COLLECTION")]
    pub source_collection: String,

    /// Target connection name (declared under `[connections]`)
    #[arg(long, value_name = "NAME")]
    pub target_connection: String,

    /// Target database name
    #[arg(long, value_name = "DATABASE")]
    pub target_database: String,

    /// Target collection name
    #[arg(long, value_name = "COLLECTION")]
    pub target_collection: String,

    /// Conflict policy (abort, skip, overwrite, generate-new-ids)
    #[arg(long, default_value_t = ConflictPolicy::Abort)]
    pub policy: ConflictPolicy,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Dry run mode - stream and report progress without writing
    #[arg(long)]
    pub dry_run: bool,
}

impl CopyArgs {
    /// Execute the copy command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting copy command");

        // Load configuration
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let dry_run = self.dry_run || config.application.dry_run;

        let request = TransferRequest::new(
            CollectionRef::new(
                &self.source_connection,
                &self.source_database,
                &self.source_collection,
            ),
            CollectionRef::new(
                &self.target_connection,
                &self.target_database,
                &self.target_collection,
            ),
            self.policy,
        );

        if let Err(e) = request.validate() {
            tracing::error!(error = %e, "Invalid copy request");
            eprintln!("Invalid copy request: {e}");
            return Ok(2);
        }

        // Resolve both connections before touching any store
        let source_connection = match config.connection(&self.source_connection) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{e}");
                return Ok(2);
            }
        };
        let target_connection = match config.connection(&self.target_connection) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{e}");
                return Ok(2);
            }
        };

        if dry_run {
            tracing::info!("Dry run mode enabled - no documents will be written");
            println!("🔍 DRY RUN MODE - No documents will be written to the target");
            println!();
        }

        // Confirmation prompt (unless --yes or dry-run)
        if !self.yes && !dry_run {
            println!("Copy Configuration:");
            println!("  Source: {}", request.source);
            println!("  Target: {}", request.target);
            println!(
                "  Conflict policy: {} ({})",
                self.policy,
                self.policy.describe()
            );
            println!();
            print!("Proceed with copy? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Copy cancelled.");
                return Ok(0);
            }
        }

        let factory = StoreFactory::new();
        let reader = factory.reader(source_connection, &request.source);
        let target = factory.target(target_connection, &request.target);

        tracing::info!("Executing copy");
        println!("🚀 Starting copy...");
        println!();

        let progress: ProgressSink = Arc::new(|pct, msg| println!("[{pct:>3}%] {msg}"));
        let mut task = TransferTask::new(request, reader, target).with_dry_run(dry_run);

        let summary = match task.run(progress, shutdown_signal).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Copy failed");
                eprintln!("Copy failed: {e}");
                return Ok(1); // Transfer failure exit code
            }
        };

        // Display summary
        println!();
        println!("📊 Transfer Summary:");
        println!("  Documents processed: {}", summary.stats.total_processed);
        println!("  Inserted: {}", summary.stats.inserted);
        println!("  Skipped: {}", summary.stats.skipped);
        println!("  Replaced: {}", summary.stats.replaced);
        println!("  Created with new ids: {}", summary.stats.created);
        println!("  Write batches: {}", summary.stats.flush_count);
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        println!();

        let exit_code = if summary.interrupted {
            println!("⚠️  Copy interrupted gracefully. Partial progress is reported above.");
            tracing::info!("Copy interrupted by user signal");
            130 // SIGINT exit code (standard Unix convention)
        } else if dry_run {
            println!("✅ Dry run completed - nothing was written");
            0
        } else {
            println!("✅ Copy completed successfully!");
            0
        };

        Ok(exit_code)
    }
}
