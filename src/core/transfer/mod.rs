//! Transfer engine
//!
//! This module provides the core transfer logic for docferry, including:
//! - Adaptive batch writing with throttle and transport retries
//! - Conflict policies for duplicate identifiers
//! - Store error classification
//! - Orchestration, progress reporting, and the long-silence heartbeat

pub mod backoff;
pub mod classify;
pub mod heartbeat;
pub mod policy;
pub mod progress;
pub mod summary;
pub mod task;
pub mod writer;

pub use classify::{classify, ErrorClass};
pub use policy::{ConflictPolicy, PRESERVED_ID_FIELD};
pub use progress::{null_sink, ProgressSink, ProgressTracker};
pub use summary::TransferSummary;
pub use task::{TransferState, TransferTask};
pub use writer::{BatchWriter, INITIAL_BATCH_SIZE, MAX_BATCH_SIZE, MIN_BATCH_SIZE};

use crate::domain::collection::CollectionRef;

/// Everything a transfer run needs to know up front.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Collection documents are read from
    pub source: CollectionRef,
    /// Collection documents are written to
    pub target: CollectionRef,
    /// How duplicate identifiers in the target are handled
    pub policy: ConflictPolicy,
}

impl TransferRequest {
    /// Creates a request from its parts.
    pub fn new(source: CollectionRef, target: CollectionRef, policy: ConflictPolicy) -> Self {
        Self {
            source,
            target,
            policy,
        }
    }

    /// Validates the request shape.
    ///
    /// Source and target must be fully named and must not be the same
    /// collection; a same-collection copy would stream from the collection
    /// it is inserting into.
    pub fn validate(&self) -> Result<(), String> {
        self.source
            .validate()
            .map_err(|e| format!("invalid source: {e}"))?;
        self.target
            .validate()
            .map_err(|e| format!("invalid target: {e}"))?;
        if self.source == self.target {
            return Err(format!(
                "source and target are the same collection ({})",
                self.source
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(source: &str, target: &str) -> TransferRequest {
        TransferRequest::new(
            CollectionRef::new("local", "db", source),
            CollectionRef::new("local", "db", target),
            ConflictPolicy::Skip,
        )
    }

    #[test]
    fn test_validate_accepts_distinct_collections() {
        assert!(request("users", "users_copy").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_same_collection() {
        let err = request("users", "users").validate().unwrap_err();
        assert!(err.contains("same collection"));
    }

    #[test]
    fn test_validate_rejects_empty_parts() {
        let err = request("", "users").validate().unwrap_err();
        assert!(err.contains("invalid source"));
    }

    #[test]
    fn test_same_name_different_connection_is_fine() {
        let req = TransferRequest::new(
            CollectionRef::new("prod", "db", "users"),
            CollectionRef::new("backup", "db", "users"),
            ConflictPolicy::Overwrite,
        );
        assert!(req.validate().is_ok());
    }
}
