// docferry - Document Collection Copy Tool
// Copyright (c) 2025 docferry Contributors
// Licensed under the MIT License

//! # docferry - Document Collection Copy
//!
//! docferry is a streaming copy engine built in Rust that transfers document
//! collections between stores, with adaptive batch sizing, conflict policies
//! for duplicate identifiers, and live progress reporting.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Streaming** documents from a source collection without loading it whole
//! - **Writing** in adaptively sized batches that grow on success and shrink
//!   under throttling
//! - **Resolving** duplicate-identifier conflicts by policy (abort, skip,
//!   overwrite, generate new ids)
//! - **Reporting** progress with percentages, time estimates, and heartbeats
//!   during quiet stretches
//!
//! ## Architecture
//!
//! docferry follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (the transfer engine)
//! - [`adapters`] - Store integrations (JSONL files, in-memory)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use docferry::adapters::MemoryStore;
//! use docferry::core::transfer::{ConflictPolicy, ProgressSink, TransferRequest, TransferTask};
//! use docferry::domain::CollectionRef;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!     let source = Arc::new(store.collection("appdb", "users"));
//!     let target = Arc::new(store.collection("appdb", "users_copy"));
//!
//!     let request = TransferRequest::new(
//!         CollectionRef::new("scratch", "appdb", "users"),
//!         CollectionRef::new("scratch", "appdb", "users_copy"),
//!         ConflictPolicy::Abort,
//!     );
//!
//!     let progress: ProgressSink = Arc::new(|pct, msg| println!("[{pct:>3}%] {msg}"));
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//!     let mut task = TransferTask::new(request, source, target);
//!     let summary = task.run(progress, shutdown_rx).await?;
//!
//!     println!("{}", summary.message());
//!     Ok(())
//! }
//! ```
//!
//! ## Conflict Policies
//!
//! Every copy runs under a [`core::transfer::ConflictPolicy`] that decides
//! what happens when a document's `_id` already exists in the target:
//!
//! ```rust
//! use docferry::core::transfer::ConflictPolicy;
//!
//! # fn example() -> Result<(), String> {
//! let policy: ConflictPolicy = "generate-new-ids".parse()?;
//! assert!(!policy.halts_on_conflict());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! docferry uses the [`domain::FerryError`] type for all errors:
//!
//! ```rust,no_run
//! use docferry::domain::FerryError;
//!
//! fn example() -> Result<(), FerryError> {
//!     // Errors are automatically converted using the ? operator
//!     let config = docferry::config::FerryConfig::from_file("docferry.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! docferry uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!("Starting copy");
//! warn!(batch_size = 37, "Write throttled, shrinking batch");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
