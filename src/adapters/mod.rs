//! Document store integrations for docferry.
//!
//! This module provides adapters for the stores documents move between:
//!
//! - [`traits`] - Store abstraction layer ([`DocumentReader`] / [`TargetCollection`])
//! - [`jsonl`] - JSON Lines files on the local filesystem
//! - [`memory`] - In-process store for tests and dry runs
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies
//! and enable testing with in-memory implementations. The transfer engine
//! only ever sees the [`traits`] layer, so a copy between any two kinds of
//! store runs through the same code path.
//!
//! # Store Factory
//!
//! [`StoreFactory`] turns a declared connection plus a collection reference
//! into trait objects the engine can drive. Memory connections are shared
//! by name, so the source and target of a test copy can live in the same
//! store:
//!
//! ```rust
//! use docferry::adapters::StoreFactory;
//! use docferry::config::ConnectionConfig;
//! use docferry::domain::CollectionRef;
//!
//! let factory = StoreFactory::new();
//! let source = CollectionRef::new("scratch", "appdb", "users");
//! let reader = factory.reader(&ConnectionConfig::Memory, &source);
//! let target = factory.target(&ConnectionConfig::Memory, &source);
//! ```

pub mod jsonl;
pub mod memory;
pub mod traits;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::ConnectionConfig;
use crate::domain::CollectionRef;

pub use jsonl::{JsonlCollection, JsonlStore};
pub use memory::{MemoryCollection, MemoryStore};
pub use traits::{
    DocumentReader, DocumentStream, EnsureOutcome, StoreInfo, TargetCollection, WriteOutcome,
};

/// Builds reader and target handles from declared connections.
///
/// JSONL connections are stateless handles over a root directory. Memory
/// connections are registered here by connection name on first use, so
/// repeated lookups of the same name observe the same documents.
#[derive(Default)]
pub struct StoreFactory {
    memory: Mutex<HashMap<String, MemoryStore>>,
}

impl StoreFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the source side of a transfer.
    pub fn reader(
        &self,
        connection: &ConnectionConfig,
        collection: &CollectionRef,
    ) -> Arc<dyn DocumentReader> {
        match connection {
            ConnectionConfig::Jsonl { root } => Arc::new(
                JsonlStore::new(root).collection(&collection.database, &collection.collection),
            ),
            ConnectionConfig::Memory => Arc::new(
                self.memory_store(&collection.connection)
                    .collection(&collection.database, &collection.collection),
            ),
        }
    }

    /// Returns the destination side of a transfer.
    pub fn target(
        &self,
        connection: &ConnectionConfig,
        collection: &CollectionRef,
    ) -> Arc<dyn TargetCollection> {
        match connection {
            ConnectionConfig::Jsonl { root } => Arc::new(
                JsonlStore::new(root).collection(&collection.database, &collection.collection),
            ),
            ConnectionConfig::Memory => Arc::new(
                self.memory_store(&collection.connection)
                    .collection(&collection.database, &collection.collection),
            ),
        }
    }

    /// Returns the shared in-memory store registered under `name`.
    pub fn memory_store(&self, name: &str) -> MemoryStore {
        let mut registry = self.memory.lock().expect("store factory lock poisoned");
        registry.entry(name.to_string()).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_connections_share_by_name() {
        let factory = StoreFactory::new();
        factory
            .memory_store("scratch")
            .seed("db", "c", vec![json!({"_id": 1})]);

        let source = CollectionRef::new("scratch", "db", "c");
        let reader = factory.reader(&ConnectionConfig::Memory, &source);
        assert_eq!(reader.count_documents().await.unwrap(), 1);

        let other = CollectionRef::new("other", "db", "c");
        let reader = factory.reader(&ConnectionConfig::Memory, &other);
        assert_eq!(reader.count_documents().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_jsonl_connection_points_at_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let factory = StoreFactory::new();
        let connection = ConnectionConfig::Jsonl {
            root: dir.path().display().to_string(),
        };
        let source = CollectionRef::new("files", "db", "c");
        let reader = factory.reader(&connection, &source);
        assert_eq!(reader.count_documents().await.unwrap(), 0);

        let target = factory.target(&connection, &source);
        target.insert_many(&[json!({"_id": 1})], true).await.unwrap();
        assert_eq!(reader.count_documents().await.unwrap(), 1);
    }
}
