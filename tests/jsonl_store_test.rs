//! Integration tests for transfers over JSON Lines stores
//!
//! These tests run whole transfers against real files in temporary
//! directories: collection layout on disk, conflict policies against an
//! existing collection, malformed input surfacing mid-stream, and what a
//! cancelled run leaves behind.

use std::sync::Arc;

use docferry::adapters::traits::{DocumentReader, TargetCollection};
use docferry::adapters::{JsonlStore, MemoryStore};
use docferry::core::transfer::{
    null_sink, ConflictPolicy, ProgressSink, TransferRequest, TransferTask,
};
use docferry::domain::{CollectionRef, FerryError, TransferError};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::{json, Value};
use tempfile::TempDir;
use test_case::test_case;
use tokio::sync::watch;

fn request(policy: ConflictPolicy) -> TransferRequest {
    TransferRequest::new(
        CollectionRef::new("src", "appdb", "events"),
        CollectionRef::new("dst", "appdb", "events"),
        policy,
    )
}

fn people(count: usize) -> Vec<Value> {
    (0..count)
        .map(|n| {
            let name: String = Name().fake();
            let email: String = SafeEmail().fake();
            json!({"_id": format!("doc-{n}"), "name": name, "email": email})
        })
        .collect()
}

fn stored_lines(path: &std::path::Path) -> Vec<Value> {
    let content = std::fs::read_to_string(path).unwrap();
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_jsonl_to_jsonl_copy_round_trip() {
    let source_root = TempDir::new().unwrap();
    let target_root = TempDir::new().unwrap();
    let source_store = JsonlStore::new(source_root.path());
    let target_store = JsonlStore::new(target_root.path());

    let source = source_store.collection("appdb", "events");
    source.insert_many(&people(350), true).await.unwrap();

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task = TransferTask::new(
        request(ConflictPolicy::Abort),
        Arc::new(source),
        Arc::new(target_store.collection("appdb", "events")),
    );
    let summary = task.run(null_sink(), shutdown_rx).await.unwrap();

    assert!(summary.is_complete());
    assert_eq!(summary.stats.inserted, 350);
    assert_eq!(summary.source_total, 350);
    assert!(summary.target_created);
    assert_eq!(summary.source.as_ref().map(|i| i.kind.as_str()), Some("jsonl"));
    assert_eq!(summary.target.as_ref().map(|i| i.kind.as_str()), Some("jsonl"));

    // One line per document, in source order.
    let stored = stored_lines(&target_root.path().join("appdb").join("events.jsonl"));
    assert_eq!(stored.len(), 350);
    assert_eq!(stored[0]["_id"], json!("doc-0"));
    assert_eq!(stored[349]["_id"], json!("doc-349"));
}

#[tokio::test]
async fn test_memory_to_jsonl_copy_creates_collection_layout() {
    let source = MemoryStore::new();
    source.seed("appdb", "events", people(40));
    let target_root = TempDir::new().unwrap();
    let target_store = JsonlStore::new(target_root.path());

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task = TransferTask::new(
        request(ConflictPolicy::Abort),
        Arc::new(source.collection("appdb", "events")),
        Arc::new(target_store.collection("appdb", "events")),
    );
    let summary = task.run(null_sink(), shutdown_rx).await.unwrap();

    assert!(summary.is_complete());
    assert!(summary.target_created);
    // <root>/<database>/<collection>.jsonl appears without any manual setup.
    assert!(target_root.path().join("appdb").join("events.jsonl").is_file());
    let reader = target_store.collection("appdb", "events");
    assert_eq!(reader.count_documents().await.unwrap(), 40);
}

#[tokio::test]
async fn test_jsonl_source_with_blank_lines_copies_cleanly() {
    let source_root = TempDir::new().unwrap();
    let db_dir = source_root.path().join("appdb");
    std::fs::create_dir_all(&db_dir).unwrap();
    std::fs::write(
        db_dir.join("events.jsonl"),
        "{\"_id\":\"e-1\",\"n\":1}\n\n{\"_id\":\"e-2\",\"n\":2}\n\n\n{\"_id\":\"e-3\",\"n\":3}\n",
    )
    .unwrap();
    let source_store = JsonlStore::new(source_root.path());
    let target = MemoryStore::new();

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task = TransferTask::new(
        request(ConflictPolicy::Abort),
        Arc::new(source_store.collection("appdb", "events")),
        Arc::new(target.collection("appdb", "events")),
    );
    let summary = task.run(null_sink(), shutdown_rx).await.unwrap();

    // Blank lines count for nothing: the job is sized and copied as 3.
    assert!(summary.is_complete());
    assert_eq!(summary.source_total, 3);
    assert_eq!(summary.stats.inserted, 3);
    let stored = target.documents("appdb", "events");
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[2]["_id"], json!("e-3"));
}

#[test_case(ConflictPolicy::Skip, 20, 10, 0, 0, 30 ; "skip keeps existing documents")]
#[test_case(ConflictPolicy::Overwrite, 0, 0, 10, 20, 30 ; "overwrite replaces in place")]
#[test_case(ConflictPolicy::GenerateNewIds, 0, 0, 0, 30, 40 ; "generate new ids keeps both copies")]
#[tokio::test]
async fn test_policy_outcomes_against_existing_collection(
    policy: ConflictPolicy,
    inserted: u64,
    skipped: u64,
    replaced: u64,
    created: u64,
    final_count: u64,
) {
    let source_root = TempDir::new().unwrap();
    let target_root = TempDir::new().unwrap();
    let source_store = JsonlStore::new(source_root.path());
    let target_store = JsonlStore::new(target_root.path());

    let source = source_store.collection("appdb", "events");
    source.insert_many(&people(30), true).await.unwrap();
    // The first ten identifiers already exist in the target.
    let target = target_store.collection("appdb", "events");
    target.insert_many(&people(10), true).await.unwrap();

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task = TransferTask::new(
        request(policy),
        Arc::new(source),
        Arc::new(target_store.collection("appdb", "events")),
    );
    let summary = task.run(null_sink(), shutdown_rx).await.unwrap();

    assert!(summary.is_complete());
    assert_eq!(summary.stats.total_processed, 30);
    assert_eq!(summary.stats.inserted, inserted);
    assert_eq!(summary.stats.skipped, skipped);
    assert_eq!(summary.stats.replaced, replaced);
    assert_eq!(summary.stats.created, created);
    assert_eq!(target.count_documents().await.unwrap(), final_count);
}

#[tokio::test]
async fn test_malformed_source_line_fails_the_transfer() {
    let source_root = TempDir::new().unwrap();
    let db_dir = source_root.path().join("appdb");
    std::fs::create_dir_all(&db_dir).unwrap();
    std::fs::write(
        db_dir.join("events.jsonl"),
        "{\"_id\":\"doc-0\"}\n{\"_id\":\"doc-1\"}\n{broken\n{\"_id\":\"doc-3\"}\n",
    )
    .unwrap();
    let source_store = JsonlStore::new(source_root.path());
    let target_root = TempDir::new().unwrap();
    let target_store = JsonlStore::new(target_root.path());

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task = TransferTask::new(
        request(ConflictPolicy::Abort),
        Arc::new(source_store.collection("appdb", "events")),
        Arc::new(target_store.collection("appdb", "events")),
    );
    let err = task.run(null_sink(), shutdown_rx).await.unwrap_err();

    match err {
        FerryError::Transfer(TransferError::Fatal { message, stats }) => {
            assert!(message.contains("source stream failed"), "{message}");
            assert!(message.contains("line 3"), "{message}");
            assert!(stats.is_empty());
        }
        other => panic!("expected a fatal transfer error, got {other}"),
    }
    // The bad line surfaced before the first flush, so nothing landed.
    let target = target_store.collection("appdb", "events");
    assert_eq!(target.count_documents().await.unwrap(), 0);
}

#[tokio::test]
async fn test_cancelled_copy_leaves_flushed_batches_on_disk() {
    let source_root = TempDir::new().unwrap();
    let target_root = TempDir::new().unwrap();
    let source_store = JsonlStore::new(source_root.path());
    let target_store = JsonlStore::new(target_root.path());

    let source = source_store.collection("appdb", "events");
    source.insert_many(&people(250), true).await.unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let signalling_tx = shutdown_tx.clone();
    let sink: ProgressSink = Arc::new(move |pct, _message| {
        if pct > 0 && pct < 100 {
            let _ = signalling_tx.send(true);
        }
    });

    let mut task = TransferTask::new(
        request(ConflictPolicy::Abort),
        Arc::new(source),
        Arc::new(target_store.collection("appdb", "events")),
    );
    let summary = task.run(sink, shutdown_rx).await.unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.stats.total_processed, 100);

    // The flushed batch is durable; nothing half-written follows it.
    let stored = stored_lines(&target_root.path().join("appdb").join("events.jsonl"));
    assert_eq!(stored.len(), 100);
    assert_eq!(stored[99]["_id"], json!("doc-99"));
}
