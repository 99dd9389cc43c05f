//! Core business logic for docferry.
//!
//! This module contains the transfer engine and its orchestration.
//!
//! # Modules
//!
//! - [`transfer`] - Adaptive batch writing, conflict policies, error
//!   classification, and transfer orchestration
//!
//! # Transfer Workflow
//!
//! The typical transfer workflow:
//!
//! 1. **Initialize**: Gather endpoint metadata for logging
//! 2. **Count**: Size the source with a fast, approximate count
//! 3. **Ensure Target**: Create the target collection if needed
//! 4. **Stream**: Pull documents lazily and land them in adaptive batches
//! 5. **Report**: Emit progress per batch and a final summary
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docferry::adapters::memory::MemoryStore;
//! use docferry::core::transfer::{ConflictPolicy, TransferRequest, TransferTask};
//! use docferry::domain::CollectionRef;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let source = store.collection("appdb", "users");
//! let target = store.collection("appdb", "users_copy");
//!
//! let request = TransferRequest::new(
//!     CollectionRef::new("scratch", "appdb", "users"),
//!     CollectionRef::new("scratch", "appdb", "users_copy"),
//!     ConflictPolicy::Skip,
//! );
//!
//! // Create shutdown signal
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! // Run the transfer
//! let mut task = TransferTask::new(request, Arc::new(source), Arc::new(target));
//! let progress: docferry::core::transfer::ProgressSink =
//!     Arc::new(|pct, msg| println!("[{pct:>3}%] {msg}"));
//! let summary = task.run(progress, shutdown_rx).await?;
//!
//! println!("{}", summary.message());
//! # Ok(())
//! # }
//! ```

pub mod transfer;
