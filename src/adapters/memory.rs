//! In-memory document store.
//!
//! Backs demos and tests, and doubles as the reference for how a store is
//! expected to behave: insertion order is preserved, identifiers are
//! unique per collection, ordered bulk writes stop at the first duplicate
//! while unordered ones attempt everything, and replace-with-upsert is
//! atomic. Duplicate failures are reported in the same shape (code 11000,
//! `E11000` message text) the classifier expects from document stores.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::watch;

use crate::adapters::traits::{
    DocumentReader, DocumentStream, EnsureOutcome, StoreInfo, TargetCollection, WriteOutcome,
};
use crate::domain::document::{display_id, ensure_id, id_key, DocumentRecord, ID_FIELD};
use crate::domain::errors::{StoreError, WriteFailure};

#[derive(Default)]
struct StoredCollection {
    documents: Vec<Value>,
    ids: HashSet<String>,
}

/// Process-local document store, cheap to clone and share.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, StoredCollection>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to a collection; the collection itself is created
    /// lazily on first write.
    pub fn collection(&self, database: &str, collection: &str) -> MemoryCollection {
        MemoryCollection {
            store: self.clone(),
            database: database.to_string(),
            collection: collection.to_string(),
        }
    }

    /// Replaces a collection's contents, assigning identifiers to
    /// documents that lack one.
    pub fn seed(&self, database: &str, collection: &str, documents: Vec<Value>) {
        let mut stored = StoredCollection::default();
        for mut doc in documents {
            if let Some(id) = ensure_id(&mut doc) {
                stored.ids.insert(id_key(&id));
            }
            stored.documents.push(doc);
        }
        self.lock()
            .insert(collection_key(database, collection), stored);
    }

    /// Snapshot of a collection's documents, in insertion order.
    pub fn documents(&self, database: &str, collection: &str) -> Vec<Value> {
        self.lock()
            .get(&collection_key(database, collection))
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }

    /// Whether a collection exists.
    pub fn exists(&self, database: &str, collection: &str) -> bool {
        self.lock()
            .contains_key(&collection_key(database, collection))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredCollection>> {
        self.collections.lock().expect("memory store lock poisoned")
    }
}

/// Handle to one collection in a [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryCollection {
    store: MemoryStore,
    database: String,
    collection: String,
}

impl MemoryCollection {
    fn key(&self) -> String {
        collection_key(&self.database, &self.collection)
    }

    fn info_sync(&self) -> StoreInfo {
        StoreInfo {
            kind: "memory".to_string(),
            location: "in-process".to_string(),
            collection: self.key(),
        }
    }
}

#[async_trait]
impl DocumentReader for MemoryCollection {
    async fn count_documents(&self) -> Result<u64, StoreError> {
        let count = self
            .store
            .lock()
            .get(&self.key())
            .map(|c| c.documents.len() as u64)
            .unwrap_or(0);
        Ok(count)
    }

    async fn stream_documents(
        &self,
        cancel: watch::Receiver<bool>,
        keep_alive: bool,
    ) -> Result<DocumentStream, StoreError> {
        // Snapshot at open; the stream itself yields lazily.
        let snapshot: VecDeque<Value> = self
            .store
            .lock()
            .get(&self.key())
            .map(|c| c.documents.iter().cloned().collect())
            .unwrap_or_default();
        tracing::debug!(
            collection = %self.key(),
            documents = snapshot.len(),
            keep_alive,
            "opened memory stream"
        );

        let stream = futures::stream::unfold((snapshot, cancel), |(mut docs, cancel)| async move {
            if *cancel.borrow() {
                return None;
            }
            let doc = docs.pop_front()?;
            Some((Ok(DocumentRecord::new(doc)), (docs, cancel)))
        });
        Ok(stream.boxed())
    }

    async fn info(&self) -> Result<StoreInfo, StoreError> {
        Ok(self.info_sync())
    }
}

#[async_trait]
impl TargetCollection for MemoryCollection {
    async fn ensure_exists(&self) -> Result<EnsureOutcome, StoreError> {
        let mut guard = self.store.lock();
        let created = !guard.contains_key(&self.key());
        guard.entry(self.key()).or_default();
        Ok(EnsureOutcome { created })
    }

    async fn insert_many(
        &self,
        documents: &[Value],
        ordered: bool,
    ) -> Result<WriteOutcome, StoreError> {
        let mut guard = self.store.lock();
        let stored = guard.entry(self.key()).or_default();

        let mut inserted = 0u64;
        let mut failures = Vec::new();
        for (index, doc) in documents.iter().enumerate() {
            let mut doc = doc.clone();
            let id = ensure_id(&mut doc);
            if let Some(id) = &id {
                let key = id_key(id);
                if stored.ids.contains(&key) {
                    let failure = WriteFailure::new(
                        index,
                        format!("E11000 duplicate key error: _id {}", display_id(Some(id))),
                    )
                    .with_code(11000)
                    .with_id(display_id(Some(id)));
                    if ordered {
                        return Err(StoreError::new(
                            "E11000 duplicate key error, insert stopped",
                        )
                        .with_code(11000)
                        .with_applied(inserted)
                        .with_failures(vec![failure]));
                    }
                    failures.push(failure);
                    continue;
                }
                stored.ids.insert(key);
            }
            stored.documents.push(doc);
            inserted += 1;
        }

        if !failures.is_empty() {
            return Err(StoreError::new(format!(
                "{} document(s) had duplicate keys",
                failures.len()
            ))
            .with_code(11000)
            .with_applied(inserted)
            .with_failures(failures));
        }
        Ok(WriteOutcome {
            inserted,
            ..WriteOutcome::default()
        })
    }

    async fn replace_upsert(&self, documents: &[Value]) -> Result<WriteOutcome, StoreError> {
        let mut guard = self.store.lock();
        let stored = guard.entry(self.key()).or_default();

        let mut replaced = 0u64;
        let mut created = 0u64;
        for doc in documents {
            let mut doc = doc.clone();
            match doc.get(ID_FIELD).cloned() {
                Some(id) => {
                    let key = id_key(&id);
                    if stored.ids.contains(&key) {
                        let position = stored
                            .documents
                            .iter()
                            .position(|existing| existing.get(ID_FIELD) == Some(&id));
                        if let Some(position) = position {
                            stored.documents[position] = doc;
                            replaced += 1;
                            continue;
                        }
                    }
                    stored.ids.insert(key);
                    stored.documents.push(doc);
                    created += 1;
                }
                None => {
                    if let Some(id) = ensure_id(&mut doc) {
                        stored.ids.insert(id_key(&id));
                    }
                    stored.documents.push(doc);
                    created += 1;
                }
            }
        }
        Ok(WriteOutcome {
            replaced,
            created,
            ..WriteOutcome::default()
        })
    }

    async fn delete_then_insert(&self, documents: &[Value]) -> Result<WriteOutcome, StoreError> {
        let mut guard = self.store.lock();
        let stored = guard.entry(self.key()).or_default();

        let incoming: HashSet<String> = documents
            .iter()
            .filter_map(|doc| doc.get(ID_FIELD))
            .map(id_key)
            .collect();
        stored.documents.retain(|doc| {
            doc.get(ID_FIELD)
                .map(|id| !incoming.contains(&id_key(id)))
                .unwrap_or(true)
        });
        for doc in documents {
            let mut doc = doc.clone();
            ensure_id(&mut doc);
            stored.documents.push(doc);
        }
        stored.ids = stored
            .documents
            .iter()
            .filter_map(|doc| doc.get(ID_FIELD))
            .map(id_key)
            .collect();
        Ok(WriteOutcome {
            replaced: documents.len() as u64,
            ..WriteOutcome::default()
        })
    }

    async fn info(&self) -> Result<StoreInfo, StoreError> {
        Ok(self.info_sync())
    }
}

fn collection_key(database: &str, collection: &str) -> String {
    format!("{database}/{collection}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str) -> Value {
        json!({"_id": id, "value": id})
    }

    #[tokio::test]
    async fn test_ordered_insert_stops_at_first_duplicate() {
        let store = MemoryStore::new();
        store.seed("db", "c", vec![doc("b")]);
        let target = store.collection("db", "c");

        let err = target
            .insert_many(&[doc("a"), doc("b"), doc("c")], true)
            .await
            .unwrap_err();
        assert_eq!(err.applied, 1);
        assert_eq!(err.code, Some(11000));
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].index, 1);
        assert_eq!(err.failures[0].id.as_deref(), Some("b"));
        // "c" was never attempted
        assert_eq!(store.documents("db", "c").len(), 2);
    }

    #[tokio::test]
    async fn test_unordered_insert_attempts_everything() {
        let store = MemoryStore::new();
        store.seed("db", "c", vec![doc("b")]);
        let target = store.collection("db", "c");

        let err = target
            .insert_many(&[doc("a"), doc("b"), doc("c")], false)
            .await
            .unwrap_err();
        assert_eq!(err.applied, 2);
        assert_eq!(err.failures.len(), 1);
        assert_eq!(store.documents("db", "c").len(), 3);
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_to_documents_without_one() {
        let store = MemoryStore::new();
        let target = store.collection("db", "c");
        let outcome = target
            .insert_many(&[json!({"value": 1})], true)
            .await
            .unwrap();
        assert_eq!(outcome.inserted, 1);
        let stored = store.documents("db", "c");
        assert!(stored[0].get("_id").is_some());
    }

    #[tokio::test]
    async fn test_replace_upsert_splits_replaced_and_created() {
        let store = MemoryStore::new();
        store.seed("db", "c", vec![json!({"_id": "a", "value": "old"})]);
        let target = store.collection("db", "c");

        let outcome = target
            .replace_upsert(&[json!({"_id": "a", "value": "new"}), doc("b")])
            .await
            .unwrap();
        assert_eq!(outcome.replaced, 1);
        assert_eq!(outcome.created, 1);
        let stored = store.documents("db", "c");
        assert_eq!(stored[0]["value"], json!("new"));
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_then_insert_replaces_conflicting_documents() {
        let store = MemoryStore::new();
        store.seed(
            "db",
            "c",
            vec![json!({"_id": "a", "value": "old"}), doc("keep")],
        );
        let target = store.collection("db", "c");

        let outcome = target
            .delete_then_insert(&[json!({"_id": "a", "value": "new"})])
            .await
            .unwrap();
        assert_eq!(outcome.replaced, 1);
        let stored = store.documents("db", "c");
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().any(|d| d["value"] == json!("new")));
    }

    #[tokio::test]
    async fn test_ensure_exists_reports_creation_once() {
        let store = MemoryStore::new();
        let target = store.collection("db", "c");
        assert!(target.ensure_exists().await.unwrap().created);
        assert!(!target.ensure_exists().await.unwrap().created);
    }

    #[tokio::test]
    async fn test_count_on_missing_collection_is_zero() {
        let store = MemoryStore::new();
        let reader = store.collection("db", "nope");
        assert_eq!(reader.count_documents().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stream_yields_in_insertion_order() {
        let store = MemoryStore::new();
        store.seed("db", "c", vec![doc("1"), doc("2"), doc("3")]);
        let reader = store.collection("db", "c");
        let (_tx, rx) = watch::channel(false);

        let mut stream = reader.stream_documents(rx, false).await.unwrap();
        let mut ids = Vec::new();
        while let Some(item) = stream.next().await {
            ids.push(item.unwrap().id_display());
        }
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_stream_ends_early_on_cancel() {
        let store = MemoryStore::new();
        store.seed("db", "c", vec![doc("1"), doc("2"), doc("3")]);
        let reader = store.collection("db", "c");
        let (tx, rx) = watch::channel(false);

        let mut stream = reader.stream_documents(rx, false).await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.id_display(), "1");
        tx.send(true).unwrap();
        assert!(stream.next().await.is_none());
    }
}
