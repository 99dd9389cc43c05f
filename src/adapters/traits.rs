//! Store abstraction traits
//!
//! This module defines the traits that document store adapters must
//! implement to work with docferry. Adapters map their native failures
//! into [`StoreError`] so the transfer engine can classify them without
//! knowing which store produced them.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use tokio::sync::watch;

use crate::domain::document::DocumentRecord;
use crate::domain::errors::StoreError;

/// Lazy, single-pass stream of source documents.
///
/// Items are pulled on demand and the stream cannot be rewound. A stream
/// ends early (without an error item) when its cancellation signal flips.
pub type DocumentStream = BoxStream<'static, Result<DocumentRecord, StoreError>>;

/// Identity of a store endpoint, for logs and summaries.
#[derive(Debug, Clone)]
pub struct StoreInfo {
    /// Adapter kind, e.g. `memory` or `jsonl`
    pub kind: String,
    /// Where the store lives (directory path, connection name)
    pub location: String,
    /// Database-qualified collection name
    pub collection: String,
}

impl StoreInfo {
    /// Renders the endpoint as `kind:location/collection`.
    pub fn describe(&self) -> String {
        format!("{}:{}/{}", self.kind, self.location, self.collection)
    }
}

/// Result of preparing a target collection for writing.
#[derive(Debug, Clone, Copy)]
pub struct EnsureOutcome {
    /// Whether the collection had to be created
    pub created: bool,
}

/// Result of a fully successful bulk write.
///
/// Partially successful writes are reported through [`StoreError`] instead,
/// with the confirmed count in its `applied` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOutcome {
    /// Documents inserted as new
    pub inserted: u64,
    /// Documents that replaced an existing document with the same id
    pub replaced: u64,
    /// Documents stored under a store-assigned identifier
    pub created: u64,
}

impl WriteOutcome {
    /// Total documents the write landed.
    pub fn total(&self) -> u64 {
        self.inserted + self.replaced + self.created
    }
}

/// Read side of a collection.
#[async_trait]
pub trait DocumentReader: Send + Sync {
    /// Fast, approximate count of documents in the collection.
    ///
    /// Implementations should prefer metadata-backed estimates over full
    /// scans; the count sizes progress reporting, nothing else depends on
    /// it being exact.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be sized at all.
    async fn count_documents(&self) -> Result<u64, StoreError>;

    /// Opens a lazy stream over the collection's documents.
    ///
    /// # Arguments
    ///
    /// * `cancel` - Signal that flips to `true` when the caller wants the
    ///   stream to stop; the stream then ends at the next pull.
    /// * `keep_alive` - Hint that the consumer may pause between pulls for
    ///   longer than the store's default cursor timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be opened. Failures while
    /// streaming surface as `Err` items.
    async fn stream_documents(
        &self,
        cancel: watch::Receiver<bool>,
        keep_alive: bool,
    ) -> Result<DocumentStream, StoreError>;

    /// Endpoint identity for logs and summaries.
    async fn info(&self) -> Result<StoreInfo, StoreError>;
}

/// Write side of a collection.
///
/// All bulk methods are all-or-error: `Ok` means every submitted document
/// landed. Anything less comes back as a [`StoreError`] carrying the
/// confirmed count and per-document failures, which is the shape the
/// engine's classifier and retry logic work from.
#[async_trait]
pub trait TargetCollection: Send + Sync {
    /// Ensures the collection exists, creating it if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be created or accessed.
    async fn ensure_exists(&self) -> Result<EnsureOutcome, StoreError>;

    /// Bulk-inserts documents.
    ///
    /// # Arguments
    ///
    /// * `documents` - Document bodies to insert. Bodies without an `_id`
    ///   get a store-assigned identifier.
    /// * `ordered` - When `true`, documents are applied in order and the
    ///   write stops at the first failure; when `false`, every document is
    ///   attempted and failures are aggregated.
    ///
    /// # Errors
    ///
    /// Returns an error when any document fails, with `applied` set to the
    /// number of documents confirmed before (ordered) or besides
    /// (unordered) the failures.
    async fn insert_many(
        &self,
        documents: &[Value],
        ordered: bool,
    ) -> Result<WriteOutcome, StoreError>;

    /// Replaces documents by identifier, inserting those that do not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot perform the upsert; a
    /// duplicate-key error here signals the store lacks atomic upsert
    /// support and the caller should fall back to
    /// [`delete_then_insert`](TargetCollection::delete_then_insert).
    async fn replace_upsert(&self, documents: &[Value]) -> Result<WriteOutcome, StoreError>;

    /// Deletes any documents with the same identifiers, then inserts.
    ///
    /// Fallback primitive for stores without atomic upsert. The two steps
    /// are applied as one visible change.
    ///
    /// # Errors
    ///
    /// Returns an error if either step fails.
    async fn delete_then_insert(&self, documents: &[Value]) -> Result<WriteOutcome, StoreError>;

    /// Endpoint identity for logs and summaries.
    async fn info(&self) -> Result<StoreInfo, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_info_describe() {
        let info = StoreInfo {
            kind: "jsonl".to_string(),
            location: "/var/data".to_string(),
            collection: "appdb/users".to_string(),
        };
        assert_eq!(info.describe(), "jsonl:/var/data/appdb/users");
    }

    #[test]
    fn test_write_outcome_total() {
        let outcome = WriteOutcome {
            inserted: 3,
            replaced: 2,
            created: 1,
        };
        assert_eq!(outcome.total(), 6);
    }
}
