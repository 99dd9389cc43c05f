//! Integration tests for dry-run mode
//!
//! These tests verify that dry-run transfers stream and account for every
//! document while never touching the target store, and that the flag is
//! honored from both the configuration file and the command line.

use std::io::Write;
use std::sync::{Arc, Mutex};

use docferry::adapters::{JsonlStore, MemoryStore};
use docferry::cli::commands::copy::CopyArgs;
use docferry::core::transfer::{
    null_sink, ConflictPolicy, ProgressSink, TransferRequest, TransferTask,
};
use docferry::domain::CollectionRef;
use serde_json::{json, Value};
use tempfile::{NamedTempFile, TempDir};
use tokio::sync::watch;

fn seed_documents(count: usize) -> Vec<Value> {
    (0..count)
        .map(|n| json!({"_id": format!("doc-{n}"), "n": n}))
        .collect()
}

fn request(policy: ConflictPolicy) -> TransferRequest {
    TransferRequest::new(
        CollectionRef::new("src", "appdb", "events"),
        CollectionRef::new("dst", "appdb", "events"),
        policy,
    )
}

#[tokio::test]
async fn test_dry_run_transfer_writes_nothing() {
    let source = MemoryStore::new();
    source.seed("appdb", "events", seed_documents(120));
    let target = MemoryStore::new();

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task = TransferTask::new(
        request(ConflictPolicy::Abort),
        Arc::new(source.collection("appdb", "events")),
        Arc::new(target.collection("appdb", "events")),
    )
    .with_dry_run(true);

    let summary = task.run(null_sink(), shutdown_rx).await.unwrap();

    assert!(summary.dry_run);
    assert!(summary.is_complete());
    assert_eq!(summary.stats.total_processed, 120);
    assert_eq!(summary.stats.inserted, 120);

    // The target was never created, let alone written to.
    assert!(!target.exists("appdb", "events"));
    assert!(target.documents("appdb", "events").is_empty());
}

#[tokio::test]
async fn test_dry_run_leaves_jsonl_target_untouched() {
    let source = MemoryStore::new();
    source.seed("appdb", "events", seed_documents(25));
    let root = TempDir::new().unwrap();
    let target = JsonlStore::new(root.path());

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task = TransferTask::new(
        request(ConflictPolicy::Overwrite),
        Arc::new(source.collection("appdb", "events")),
        Arc::new(target.collection("appdb", "events")),
    )
    .with_dry_run(true);

    let summary = task.run(null_sink(), shutdown_rx).await.unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.stats.total_processed, 25);
    // No file and no database directory appeared under the root.
    assert!(!root.path().join("appdb").exists());
}

#[tokio::test]
async fn test_dry_run_attributes_outcomes_per_policy() {
    for policy in ConflictPolicy::ALL {
        let source = MemoryStore::new();
        source.seed("appdb", "events", seed_documents(30));
        let target = MemoryStore::new();

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut task = TransferTask::new(
            request(policy),
            Arc::new(source.collection("appdb", "events")),
            Arc::new(target.collection("appdb", "events")),
        )
        .with_dry_run(true);

        let summary = task.run(null_sink(), shutdown_rx).await.unwrap();
        let stats = &summary.stats;
        assert_eq!(stats.total_processed, 30, "policy {policy}");
        match policy {
            ConflictPolicy::Abort | ConflictPolicy::Skip => {
                assert_eq!(stats.inserted, 30, "policy {policy}")
            }
            ConflictPolicy::Overwrite => assert_eq!(stats.replaced, 30, "policy {policy}"),
            ConflictPolicy::GenerateNewIds => assert_eq!(stats.created, 30, "policy {policy}"),
        }
        assert!(!target.exists("appdb", "events"), "policy {policy}");
    }
}

#[tokio::test]
async fn test_dry_run_reports_full_progress() {
    let source = MemoryStore::new();
    source.seed("appdb", "events", seed_documents(250));
    let target = MemoryStore::new();

    let seen: Arc<Mutex<Vec<(u8, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = seen.clone();
    let progress: ProgressSink = Arc::new(move |pct, message| {
        sink_seen.lock().unwrap().push((pct, message.to_string()));
    });

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task = TransferTask::new(
        request(ConflictPolicy::Skip),
        Arc::new(source.collection("appdb", "events")),
        Arc::new(target.collection("appdb", "events")),
    )
    .with_dry_run(true);

    task.run(progress, shutdown_rx).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.first().map(|(pct, _)| *pct), Some(0));
    assert!(seen[0].1.contains("Copying 250 documents"), "{}", seen[0].1);
    assert_eq!(seen.last().map(|(pct, _)| *pct), Some(100));
    // Progress percentages never go backwards.
    let percents: Vec<u8> = seen.iter().map(|(pct, _)| *pct).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
}

#[tokio::test]
async fn test_copy_command_honors_config_dry_run() {
    // dry_run comes from the configuration file here, not the flag.
    let mut config = NamedTempFile::new().unwrap();
    config
        .write_all(
            br#"
[application]
dry_run = true

[connections.scratch]
kind = "memory"
"#,
        )
        .unwrap();
    config.flush().unwrap();

    let args = CopyArgs {
        source_connection: "scratch".to_string(),
        source_database: "appdb".to_string(),
        source_collection: "events".to_string(),
        target_connection: "scratch".to_string(),
        target_database: "appdb".to_string(),
        target_collection: "events_copy".to_string(),
        policy: ConflictPolicy::Abort,
        yes: true,
        dry_run: false,
    };

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let exit = args
        .execute(config.path().to_str().unwrap(), shutdown_rx)
        .await
        .unwrap();
    assert_eq!(exit, 0);
}

#[test]
fn test_application_config_dry_run_parsing() {
    let config: docferry::config::FerryConfig = toml::from_str(
        r#"
[application]
dry_run = true

[connections.scratch]
kind = "memory"
"#,
    )
    .unwrap();
    assert!(config.application.dry_run);

    let default_config = docferry::config::FerryConfig::default();
    assert!(!default_config.application.dry_run);
}
