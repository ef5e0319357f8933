//! Directory walking, worker dispatch, and background watching for dataconv.
//!
//! This crate is the orchestration layer around
//! [`FileConverter`](dc_format::FileConverter): it finds eligible files,
//! fans conversion work out across a configurable worker pool, writes the
//! mirrored output tree, and keeps a polling watcher alive per source
//! directory.
//!
//! # Overview
//!
//! - [`DirectoryWalker`]: enumerates eligible files (hidden entries
//!   skipped, recursion optional), owns the output-path mapping and the
//!   write phase of each cycle
//! - [`Dispatcher`]: runs one batch of conversion jobs in the configured
//!   [`ExecMode`](dc_core::ExecMode) and collects one outcome per job
//! - [`ErrorSink`]: logs per-file failures exactly once per distinct
//!   (path, cause) pair, however many cycles observe them
//! - [`WatcherRegistry`]: injectable at-most-one-watcher-per-path service
//! - [`DirectoryWatcher`]: the long-lived poll loop on a blocking task,
//!   streaming per-cycle updates to async consumers
//!
//! # Architecture
//!
//! ```text
//! DirectoryWatcher (spawn_blocking loop, one per registered path)
//!     │  every poll interval
//!     ▼
//! DirectoryWalker::convert_all
//!     │
//!     ├── collect_paths (ignore crate, hidden entries skipped)
//!     │
//!     ├── Dispatcher::run_batch ──► FileConverter per file
//!     │       sequential | threaded (rayon) | multiprocess (worker exe)
//!     │       └── barrier: all outcomes collected before the write phase
//!     │
//!     ├── write mirrored outputs (<target>/<rel>/<name>.<ext>.json)
//!     │
//!     └── ErrorSink (dedup + error log) for failures
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dc_core::{ExecMode, WatchConfig};
//! use dc_format::FileConverter;
//! use dc_pipeline::{
//!     DirectoryWalker, DirectoryWatcher, Dispatcher, ErrorSink, WatcherRegistry,
//! };
//! use camino::Utf8Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let walker = DirectoryWalker::from_paths(
//!     Utf8Path::new("uploads"),
//!     Utf8Path::new("converted"),
//!     true,
//! )?;
//! let dispatcher = Dispatcher::new(ExecMode::Threaded);
//! let converter = FileConverter::new(None)?;
//! let sink = Arc::new(ErrorSink::new(None));
//! let registry = WatcherRegistry::new();
//!
//! let mut watcher = DirectoryWatcher::start(
//!     walker,
//!     dispatcher,
//!     converter,
//!     sink,
//!     &WatchConfig::default(),
//!     &registry,
//! )
//! .await?;
//!
//! while let Some(update) = watcher.recv().await {
//!     println!("cycle: {update:?}");
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod dispatch;
mod error;
mod registry;
mod sink;
mod stats;
mod walker;
mod watcher;

pub use dispatch::{BatchOutcome, Dispatcher, WorkerErrorKind, WorkerReport};
pub use error::PipelineError;
pub use registry::{RegistryGuard, WatcherRegistry};
pub use sink::ErrorSink;
pub use stats::{CycleSnapshot, RunSnapshot, RunStats};
pub use walker::DirectoryWalker;
pub use watcher::{DirectoryWatcher, WatchUpdate};
