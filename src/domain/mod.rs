//! Domain models and types for docferry.
//!
//! This module contains the core domain models, types, and business rules
//! for docferry. All types are store-agnostic: documents are opaque JSON,
//! collections are addressed by name, and errors never expose third-party
//! types.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Document model** ([`DocumentRecord`]) wrapping opaque JSON payloads
//! - **Collection addressing** ([`CollectionRef`])
//! - **Transfer accounting** ([`TransferStats`], [`ProgressDelta`])
//! - **Error types** ([`FerryError`], [`TransferError`], [`StoreError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, FerryError>`]:
//!
//! ```rust
//! use docferry::domain::{FerryError, Result};
//!
//! fn example() -> Result<()> {
//!     // Errors are automatically converted using the ? operator
//!     let config = docferry::config::FerryConfig::from_file("docferry.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! # Partial Progress
//!
//! Errors raised mid-transfer carry the statistics accumulated so far:
//!
//! ```rust
//! use docferry::domain::{TransferError, TransferStats};
//!
//! let err = TransferError::Fatal {
//!     message: "disk full".to_string(),
//!     stats: TransferStats::new(),
//! };
//! assert_eq!(err.stats().total_processed, 0);
//! ```

pub mod collection;
pub mod document;
pub mod errors;
pub mod result;
pub mod stats;

// Re-export commonly used types for convenience
pub use collection::CollectionRef;
pub use document::{DocumentRecord, ID_FIELD};
pub use errors::{FerryError, StoreError, TransferError, WriteFailure};
pub use result::Result;
pub use stats::{OutcomeKind, ProgressDelta, TransferStats};
