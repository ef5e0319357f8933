//! Error types for the dc-pipeline crate.
//!
//! This module provides the [`PipelineError`] type for failures of the
//! walker, dispatcher, registry, and watcher. Per-file conversion failures
//! are *not* pipeline errors - those are
//! [`ConvertError`](dc_format::ConvertError)s, contained at the walker
//! level and routed through the error sink.

use camino::Utf8PathBuf;

/// Errors that can occur in the conversion pipeline.
///
/// # Error Recovery Strategy
///
/// - **Duplicate watcher** ([`PipelineError::DuplicateWatcher`]): raised
///   synchronously to the caller of `DirectoryWatcher::start`; never
///   logged-and-swallowed. It is a configuration mistake, not a data error.
/// - **Walk / I/O errors**: fatal for the current cycle; the watcher logs
///   them and retries on the next poll.
/// - **Non-UTF-8 path**: the offending entry is skipped.
///
/// # Examples
///
/// ```
/// use dc_pipeline::PipelineError;
/// use camino::Utf8PathBuf;
///
/// let err = PipelineError::DuplicateWatcher(Utf8PathBuf::from("/data/uploads"));
/// assert!(err.to_string().contains("/data/uploads"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A watcher is already registered for this normalized directory path.
    #[error("a watcher for {0} already exists")]
    DuplicateWatcher(Utf8PathBuf),

    /// Failed to walk a directory.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path is not valid UTF-8.
    ///
    /// This crate uses UTF-8 paths throughout; entries with non-UTF-8
    /// names cannot be processed.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// Invalid pipeline configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The watcher's update or shutdown channel closed unexpectedly.
    #[error("watcher channel closed unexpectedly")]
    ChannelClosed,
}

impl PipelineError {
    /// Creates a new [`PipelineError::Config`] error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` if this error is recoverable (the watcher can keep
    /// polling).
    ///
    /// Walk and I/O failures are retried on the next cycle; a skipped
    /// non-UTF-8 entry does not affect other files.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Walk(_) | Self::Io(_) | Self::NonUtf8Path(_))
    }

    /// Returns `true` if this error is fatal (the operation should not be
    /// retried as-is).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the directory path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::DuplicateWatcher(path) => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_duplicate_watcher() {
        let err = PipelineError::DuplicateWatcher(Utf8PathBuf::from("/watched"));
        assert!(err.is_fatal());
        assert_eq!(err.path().map(|p| p.as_str()), Some("/watched"));
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_io_is_recoverable() {
        let err = PipelineError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
        assert!(err.path().is_none());
    }

    #[test]
    fn test_config_display() {
        let err = PipelineError::config("bad worker command");
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "invalid configuration: bad worker command");
    }

    #[test]
    fn test_channel_closed() {
        let err = PipelineError::ChannelClosed;
        assert!(err.is_fatal());
        assert!(err.to_string().contains("channel closed"));
    }
}
