//! Background directory watcher with interval polling.
//!
//! This module provides the [`DirectoryWatcher`] type: a poll loop on a
//! dedicated blocking task that re-runs the walk-convert-write cycle on a
//! fixed interval, bridged to async consumers through a bounded channel.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Blocking Task (spawn_blocking)               │
//! │  loop {                                                         │
//! │      DirectoryWalker::convert_all  (one full cycle)             │
//! │      update_tx.blocking_send(CycleComplete)                     │
//! │      shutdown_rx.recv_timeout(poll_interval)  // sleep + stop   │
//! │  }                                                              │
//! └───────────────────────────────│─────────────────────────────────┘
//!                                 │ blocking_send
//!                                 ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Async Runtime (tokio)                        │
//! │  DirectoryWatcher ── recv() ──► per-cycle WatchUpdate stream    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! Stopped → Running → Stopped, nothing in between. Starting registers
//! the source path in the [`WatcherRegistry`] - a second watcher on a
//! path-equal directory fails fast with
//! [`PipelineError::DuplicateWatcher`]. Stopping is caller-driven; the
//! stop request is honored between cycles, never mid-flight, and releases
//! the registry slot for a future watcher.
//!
//! Every cycle reprocesses every file in the source directory. What keeps
//! steady-state quiet is the error sink's deduplication, not change
//! detection.

use std::sync::Arc;
use std::sync::mpsc::{self as std_mpsc, RecvTimeoutError};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use dc_core::WatchConfig;
use dc_format::FileConverter;

use crate::dispatch::Dispatcher;
use crate::error::PipelineError;
use crate::registry::{RegistryGuard, WatcherRegistry};
use crate::sink::ErrorSink;
use crate::stats::{CycleSnapshot, RunSnapshot, RunStats};
use crate::walker::DirectoryWalker;

/// Default capacity of the per-cycle update channel.
const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Update emitted after each watch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchUpdate {
    /// A full walk-convert-write cycle finished.
    CycleComplete(CycleSnapshot),

    /// The cycle could not run (e.g. the source directory vanished).
    ///
    /// The watcher keeps polling; the directory may reappear.
    CycleFailed {
        /// Rendered description of the failure.
        reason: String,
    },
}

/// A background watcher that converts a directory on a fixed interval.
///
/// # Lifecycle
///
/// 1. **Creation**: [`start`](Self::start) registers the path, spawns the
///    blocking poll loop, and returns without blocking the caller.
/// 2. **Updates**: [`recv`](Self::recv) / [`try_recv`](Self::try_recv)
///    yield one [`WatchUpdate`] per completed cycle.
/// 3. **Shutdown**: [`shutdown`](Self::shutdown) signals the loop and
///    awaits it. Dropping the watcher signals the loop as a best effort.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use dc_core::{ExecMode, WatchConfig};
/// use dc_format::FileConverter;
/// use dc_pipeline::{
///     DirectoryWalker, DirectoryWatcher, Dispatcher, ErrorSink, WatcherRegistry,
/// };
/// use camino::Utf8Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let walker = DirectoryWalker::from_paths(
///     Utf8Path::new("uploads"),
///     Utf8Path::new("converted"),
///     true,
/// )?;
///
/// let mut watcher = DirectoryWatcher::start(
///     walker,
///     Dispatcher::new(ExecMode::Threaded),
///     FileConverter::new(None)?,
///     Arc::new(ErrorSink::new(None)),
///     &WatchConfig::default(),
///     &WatcherRegistry::new(),
/// )
/// .await?;
///
/// while let Some(update) = watcher.recv().await {
///     println!("{update:?}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct DirectoryWatcher {
    /// Stop signal sender; `None` once shutdown has been initiated.
    shutdown_tx: Option<std_mpsc::Sender<()>>,

    /// Handle to the blocking poll-loop task.
    task_handle: Option<JoinHandle<Result<(), PipelineError>>>,

    /// Per-cycle update receiver.
    update_rx: mpsc::Receiver<WatchUpdate>,

    /// The directory being watched.
    watch_path: Utf8PathBuf,

    /// Cumulative statistics, shared with the poll loop.
    stats: Arc<RunStats>,
}

impl std::fmt::Debug for DirectoryWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryWatcher")
            .field("watch_path", &self.watch_path)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl DirectoryWatcher {
    /// Starts watching the walker's source directory.
    ///
    /// Registers the path, then spawns the poll loop on a blocking task.
    /// The caller does not block; join or shut down explicitly when done.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DuplicateWatcher`] synchronously if the
    /// normalized source path already has an active watcher, or
    /// [`PipelineError::Io`] if the path cannot be canonicalized.
    #[allow(clippy::unused_async)] // Async for API consistency with shutdown()
    pub async fn start(
        walker: DirectoryWalker,
        dispatcher: Dispatcher,
        converter: FileConverter,
        sink: Arc<ErrorSink>,
        config: &WatchConfig,
        registry: &WatcherRegistry,
    ) -> Result<Self, PipelineError> {
        // The registry entry is the mutual-exclusion mechanism; claiming
        // it must happen before any task is spawned.
        let guard = registry.register(walker.source())?;
        let watch_path = guard.path().to_owned();

        let interval = Duration::from_secs(config.poll_interval_secs.max(1));

        let (update_tx, update_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = std_mpsc::channel();

        let stats = Arc::new(RunStats::new());

        let watch_loop = WatchLoop {
            walker,
            dispatcher,
            converter,
            sink,
            interval,
            update_tx,
            shutdown_rx,
            stats: Arc::clone(&stats),
        };
        let task_handle = tokio::task::spawn_blocking(move || watch_loop.run(guard));

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
            update_rx,
            watch_path,
            stats,
        })
    }

    /// Receives the next per-cycle update asynchronously.
    ///
    /// Returns `None` once the watcher has stopped and the channel drained.
    pub async fn recv(&mut self) -> Option<WatchUpdate> {
        self.update_rx.recv().await
    }

    /// Tries to receive an update without blocking.
    pub fn try_recv(&mut self) -> Result<WatchUpdate, mpsc::error::TryRecvError> {
        self.update_rx.try_recv()
    }

    /// Returns the canonicalized path being watched.
    #[must_use]
    pub fn watch_path(&self) -> &Utf8Path {
        &self.watch_path
    }

    /// Returns cumulative statistics across all completed cycles.
    #[must_use]
    pub fn stats(&self) -> RunSnapshot {
        self.stats.snapshot()
    }

    /// Returns `true` while the poll loop is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some() && self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Gracefully stops the watcher.
    ///
    /// Signals the poll loop, awaits its completion, and releases the
    /// registry slot. The stop takes effect before the next cycle starts;
    /// a cycle already in flight runs to completion first.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ChannelClosed`] if the poll-loop task
    /// panicked instead of exiting cleanly.
    pub async fn shutdown(mut self) -> Result<(), PipelineError> {
        if let Some(tx) = self.shutdown_tx.take() {
            // Ignore error if the loop already exited.
            let _ = tx.send(());
        }

        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(result) => result?,
                Err(_join_error) => return Err(PipelineError::ChannelClosed),
            }
        }

        Ok(())
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        // Best-effort stop; the loop also exits when it observes the
        // disconnected channel at its next interval check.
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// State moved into the blocking poll-loop task.
struct WatchLoop {
    walker: DirectoryWalker,
    dispatcher: Dispatcher,
    converter: FileConverter,
    sink: Arc<ErrorSink>,
    interval: Duration,
    update_tx: mpsc::Sender<WatchUpdate>,
    shutdown_rx: std_mpsc::Receiver<()>,
    stats: Arc<RunStats>,
}

impl WatchLoop {
    /// Runs cycles until a stop is requested.
    ///
    /// The registry guard lives for the duration of the loop, so the slot
    /// is released however the loop ends.
    fn run(self, _guard: RegistryGuard) -> Result<(), PipelineError> {
        info!(
            path = %self.walker.source(),
            interval_secs = self.interval.as_secs(),
            recursive = self.walker.is_recursive(),
            "Directory watcher started"
        );

        loop {
            match self
                .walker
                .convert_all(&self.dispatcher, &self.converter, &self.sink)
            {
                Ok(snapshot) => {
                    self.stats.record_cycle(&snapshot);
                    if self
                        .update_tx
                        .blocking_send(WatchUpdate::CycleComplete(snapshot))
                        .is_err()
                    {
                        tracing::debug!("Update channel closed, continuing unobserved");
                    }
                }
                Err(cycle_error) => {
                    warn!(
                        path = %self.walker.source(),
                        error = %cycle_error,
                        "Watch cycle failed"
                    );
                    let _ = self.update_tx.blocking_send(WatchUpdate::CycleFailed {
                        reason: cycle_error.to_string(),
                    });
                }
            }

            // Interval sleep doubles as the stop check: a stop request
            // interrupts the wait, and a disconnected sender means the
            // watcher handle is gone entirely.
            match self.shutdown_rx.recv_timeout(self.interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }

        info!(path = %self.walker.source(), "Directory watcher stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_core::ExecMode;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        source: Utf8PathBuf,
        target: Utf8PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let source = Utf8PathBuf::from_path_buf(dir.path().join("uploads")).unwrap();
        let target = Utf8PathBuf::from_path_buf(dir.path().join("converted")).unwrap();
        fs::create_dir_all(source.as_std_path()).unwrap();
        Fixture {
            _dir: dir,
            source,
            target,
        }
    }

    async fn start_watcher(
        fx: &Fixture,
        registry: &WatcherRegistry,
    ) -> Result<DirectoryWatcher, PipelineError> {
        let walker = DirectoryWalker::from_paths(&fx.source, &fx.target, true)?;
        DirectoryWatcher::start(
            walker,
            Dispatcher::new(ExecMode::Sequential),
            FileConverter::new(None).unwrap(),
            Arc::new(ErrorSink::new(None)),
            &WatchConfig {
                poll_interval_secs: 1,
                recursive: true,
            },
            registry,
        )
        .await
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let fx = fixture();
        let registry = WatcherRegistry::new();

        let watcher = start_watcher(&fx, &registry).await.unwrap();
        assert!(watcher.is_running());
        assert!(registry.is_registered(&fx.source));

        watcher.shutdown().await.unwrap();
        assert!(!registry.is_registered(&fx.source));
    }

    #[tokio::test]
    async fn test_duplicate_watcher_fails_fast() {
        let fx = fixture();
        let registry = WatcherRegistry::new();

        let first = start_watcher(&fx, &registry).await.unwrap();
        let second = start_watcher(&fx, &registry).await;
        assert!(matches!(second, Err(PipelineError::DuplicateWatcher(_))));

        first.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_watcher_on_path_equal_spelling() {
        let fx = fixture();
        let registry = WatcherRegistry::new();

        let first = start_watcher(&fx, &registry).await.unwrap();

        // Same directory, different spelling.
        let dotted = fx.source.join(".");
        let walker = DirectoryWalker::from_paths(&dotted, &fx.target, true).unwrap();
        let second = DirectoryWatcher::start(
            walker,
            Dispatcher::new(ExecMode::Sequential),
            FileConverter::new(None).unwrap(),
            Arc::new(ErrorSink::new(None)),
            &WatchConfig::default(),
            &registry,
        )
        .await;
        assert!(matches!(second, Err(PipelineError::DuplicateWatcher(_))));

        first.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_restart_after_shutdown() {
        let fx = fixture();
        let registry = WatcherRegistry::new();

        let first = start_watcher(&fx, &registry).await.unwrap();
        first.shutdown().await.unwrap();

        // The slot was released; a new watcher may claim it.
        let second = start_watcher(&fx, &registry).await.unwrap();
        second.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_watcher_converts_and_reports_cycles() {
        let fx = fixture();
        fs::write(
            fx.source.join("sales.csv").as_std_path(),
            "id,amount\n1,10\n2,20\n",
        )
        .unwrap();

        let registry = WatcherRegistry::new();
        let mut watcher = start_watcher(&fx, &registry).await.unwrap();

        let update = tokio::time::timeout(Duration::from_secs(10), watcher.recv())
            .await
            .unwrap()
            .unwrap();

        match update {
            WatchUpdate::CycleComplete(snapshot) => {
                assert_eq!(snapshot.discovered, 1);
                assert_eq!(snapshot.converted, 1);
            }
            other => panic!("expected CycleComplete, got {other:?}"),
        }

        assert!(fx.target.join("sales.csv.json").exists());
        assert!(watcher.stats().cycles >= 1);

        watcher.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_watcher_picks_up_new_files() {
        let fx = fixture();
        let registry = WatcherRegistry::new();
        let mut watcher = start_watcher(&fx, &registry).await.unwrap();

        // Let the first (empty) cycle pass, then add a file.
        let _ = tokio::time::timeout(Duration::from_secs(10), watcher.recv()).await;
        fs::write(fx.source.join("late.json").as_std_path(), "{\"k\": 1}").unwrap();

        // Wait until some later cycle reports a conversion.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(15);
        let mut converted = false;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_secs(10), watcher.recv()).await {
                Ok(Some(WatchUpdate::CycleComplete(snapshot))) if snapshot.converted > 0 => {
                    converted = true;
                    break;
                }
                Ok(Some(_)) => {}
                _ => break,
            }
        }

        assert!(converted, "new file was never converted");
        assert!(fx.target.join("late.json.json").exists());

        watcher.shutdown().await.unwrap();
    }
}
