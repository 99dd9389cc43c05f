//! Domain error types
//!
//! This module defines the error hierarchy for docferry. All errors are
//! domain-specific and don't expose third-party types. Errors raised while
//! documents were already flowing carry a [`TransferStats`] snapshot so the
//! caller can always report partial progress.

use std::fmt;

use thiserror::Error;

use crate::domain::stats::TransferStats;

/// Main docferry error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum FerryError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A connection name that does not exist in configuration
    #[error("Unknown connection '{0}' (not declared under [connections])")]
    UnknownConnection(String),

    /// The source collection could not be sized before streaming
    #[error("Could not size the job: {0}")]
    Count(String),

    /// The target collection could not be prepared for writing
    #[error("Could not prepare the destination: {0}")]
    EnsureTarget(String),

    /// Errors raised while documents were being transferred
    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors escaping the transfer engine.
///
/// Every variant carries the statistics accumulated up to the failure so
/// callers can report "X of Y processed" even on the error path.
#[derive(Debug, Error)]
pub enum TransferError {
    /// A duplicate identifier stopped the transfer under the abort policy
    #[error("Duplicate id {id} already exists in the target: {message}")]
    Conflict {
        /// Rendered identifier of the first conflicting document
        id: String,
        /// Store-reported failure message
        message: String,
        /// Progress at the moment the conflict surfaced
        stats: TransferStats,
    },

    /// The writer gave up after repeated attempts made no progress
    #[error("Gave up after {attempts} attempts without progress: {message}")]
    RetriesExhausted {
        /// Consecutive attempts that moved nothing
        attempts: u32,
        /// Message from the last failed attempt
        message: String,
        /// Progress frozen at the last successful write
        stats: TransferStats,
    },

    /// An error the engine does not know how to retry
    #[error("Write failed: {message}")]
    Fatal {
        /// Store or stream failure message
        message: String,
        /// Progress at the moment of failure
        stats: TransferStats,
    },

    /// The transfer was cancelled by the caller
    #[error("Transfer cancelled")]
    Cancelled {
        /// Progress at the moment cancellation was observed
        stats: TransferStats,
    },
}

impl TransferError {
    /// The statistics snapshot carried by this error.
    pub fn stats(&self) -> &TransferStats {
        match self {
            TransferError::Conflict { stats, .. }
            | TransferError::RetriesExhausted { stats, .. }
            | TransferError::Fatal { stats, .. }
            | TransferError::Cancelled { stats } => stats,
        }
    }

    /// True when the error ended the run due to caller cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransferError::Cancelled { .. })
    }
}

/// One failed document inside a bulk write response.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteFailure {
    /// Zero-based position of the document in the submitted batch
    pub index: usize,
    /// Store-specific numeric error code, if reported
    pub code: Option<i32>,
    /// Rendered identifier of the failed document, if known
    pub id: Option<String>,
    /// Store-reported failure message
    pub message: String,
}

impl WriteFailure {
    /// Creates a failure record for the document at `index`.
    pub fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            code: None,
            id: None,
            message: message.into(),
        }
    }

    /// Sets the store-specific error code
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Sets the failed document's identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Error reported by a document store adapter.
///
/// This is the shape the engine classifies: a store-specific numeric code,
/// a message, how many documents the store confirmed before failing, and
/// per-document failures from bulk responses. Adapters map their native
/// errors into this shape; the engine never sees store SDK types.
#[derive(Debug, Clone, Default)]
pub struct StoreError {
    /// Store-specific numeric error code, if reported
    pub code: Option<i32>,
    /// Store-reported failure message
    pub message: String,
    /// Documents the store confirmed as written before the failure
    pub applied: u64,
    /// Per-document failures from a bulk response
    pub failures: Vec<WriteFailure>,
}

impl StoreError {
    /// Creates an error with a message and no further detail.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            applied: 0,
            failures: Vec::new(),
        }
    }

    /// Sets the store-specific error code
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Sets the count of documents written before the failure
    pub fn with_applied(mut self, applied: u64) -> Self {
        self.applied = applied;
        self
    }

    /// Attaches per-document failures from a bulk response
    pub fn with_failures(mut self, failures: Vec<WriteFailure>) -> Self {
        self.failures = failures;
        self
    }

    /// The first per-document failure, if any.
    pub fn first_failure(&self) -> Option<&WriteFailure> {
        self.failures.first()
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "store error (code {}): {}", code, self.message)?,
            None => write!(f, "store error: {}", self.message)?,
        }
        if !self.failures.is_empty() {
            write!(f, " [{} document(s) failed]", self.failures.len())?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {}

// Conversion from std::io::Error
impl From<std::io::Error> for FerryError {
    fn from(err: std::io::Error) -> Self {
        FerryError::Io(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for FerryError {
    fn from(err: toml::de::Error) -> Self {
        FerryError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from std::io::Error, preserving the kind text so network
// failures stay recognizable to the classifier
impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::new(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::new(format!("invalid JSON: {err}"))
    }
}
