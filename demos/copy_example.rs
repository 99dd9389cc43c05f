//! Example demonstrating a docferry copy end to end
//!
//! This example shows how to:
//! - Initialize structured logging
//! - Seed an in-memory store with documents
//! - Run a transfer with live progress reporting
//!
//! Run with:
//! ```bash
//! cargo run --example copy_example
//! ```

use std::sync::Arc;

use docferry::adapters::MemoryStore;
use docferry::config::LoggingConfig;
use docferry::core::transfer::{ConflictPolicy, ProgressSink, TransferRequest, TransferTask};
use docferry::domain::CollectionRef;
use docferry::logging::init_logging;
use serde_json::json;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Console logging only. Set file_enabled to get a JSON log file with
    // rotation alongside it.
    let config = LoggingConfig::default();
    let _guard = init_logging("info", &config)?;

    // Seed a source collection with a few thousand documents.
    let store = MemoryStore::new();
    let documents = (0..2_500)
        .map(|n| json!({"_id": format!("order-{n}"), "total": n * 3, "status": "shipped"}))
        .collect();
    store.seed("shopdb", "orders", documents);

    let request = TransferRequest::new(
        CollectionRef::new("scratch", "shopdb", "orders"),
        CollectionRef::new("scratch", "shopdb", "orders_copy"),
        ConflictPolicy::Abort,
    );

    // Print every progress update the way the CLI would.
    let progress: ProgressSink = Arc::new(|pct, message| {
        println!("[{pct:>3}%] {message}");
    });
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut task = TransferTask::new(
        request,
        Arc::new(store.collection("shopdb", "orders")),
        Arc::new(store.collection("shopdb", "orders_copy")),
    );
    let summary = task.run(progress, shutdown_rx).await?;

    println!("\n✅ {}", summary.message());
    println!(
        "📊 {} of {} documents in {:?}",
        summary.stats.total_processed, summary.source_total, summary.duration
    );

    Ok(())
}
