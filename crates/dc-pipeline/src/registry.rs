//! Watcher registry: at most one active watcher per normalized path.
//!
//! The registry is an explicit, injectable service rather than process
//! global state, so tests (and embedders) can run independent registries
//! side by side. Clones share the same underlying set, which is what makes
//! a clone held by a watcher task and a clone held by the caller agree.
//!
//! Paths are canonicalized before registration, so `./data`, `data/`, and
//! `data/.` all contend for the same slot.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use tracing::debug;

use dc_core::FxHashSet;

use crate::error::PipelineError;

/// Tracks which directory paths currently have an active watcher.
///
/// # Thread Safety
///
/// `WatcherRegistry` is cheaply cloneable; all clones share one set behind
/// a mutex, so concurrent `register` calls for the same path race safely
/// and exactly one wins.
///
/// # Examples
///
/// ```
/// use dc_pipeline::WatcherRegistry;
/// use camino::Utf8Path;
///
/// let registry = WatcherRegistry::new();
/// let dir = std::env::temp_dir();
/// let dir = Utf8Path::from_path(&dir).unwrap();
///
/// let guard = registry.register(dir).unwrap();
/// assert!(registry.register(dir).is_err()); // second watcher refused
///
/// drop(guard);
/// assert!(registry.register(dir).is_ok()); // slot released
/// ```
#[derive(Debug, Clone, Default)]
pub struct WatcherRegistry {
    /// Canonicalized paths with an active watcher.
    held: Arc<Mutex<FxHashSet<Utf8PathBuf>>>,
}

impl WatcherRegistry {
    /// Creates a new empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the given directory path for a new watcher.
    ///
    /// The path is canonicalized first, so spellings that resolve to the
    /// same directory collide. The returned guard releases the slot when
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DuplicateWatcher`] if the normalized path
    /// is already registered, or [`PipelineError::Io`] if it cannot be
    /// canonicalized (e.g. it does not exist).
    pub fn register(&self, path: &Utf8Path) -> Result<RegistryGuard, PipelineError> {
        let normalized = path.canonicalize_utf8()?;

        let mut held = self.held.lock();
        if !held.insert(normalized.clone()) {
            return Err(PipelineError::DuplicateWatcher(normalized));
        }
        drop(held);

        debug!(path = %normalized, "Registered watcher path");
        Ok(RegistryGuard {
            registry: self.clone(),
            path: normalized,
        })
    }

    /// Returns `true` if the given path currently has an active watcher.
    ///
    /// Returns `false` for paths that cannot be canonicalized.
    #[must_use]
    pub fn is_registered(&self, path: &Utf8Path) -> bool {
        path.canonicalize_utf8()
            .map(|normalized| self.held.lock().contains(&normalized))
            .unwrap_or(false)
    }

    /// Returns the number of active registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.held.lock().len()
    }

    /// Returns `true` if no watcher is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.lock().is_empty()
    }

    /// Releases a registration slot.
    fn release(&self, path: &Utf8Path) {
        self.held.lock().remove(path);
        debug!(path = %path, "Released watcher path");
    }
}

/// Holds a registered path; dropping it releases the slot.
///
/// The watcher's poll loop owns its guard, so the slot is released when the
/// loop exits - whether through a graceful shutdown or a panic unwinding
/// the blocking task.
#[derive(Debug)]
pub struct RegistryGuard {
    registry: WatcherRegistry,
    path: Utf8PathBuf,
}

impl RegistryGuard {
    /// Returns the canonicalized path held by this guard.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        self.registry.release(&self.path);
    }
}
