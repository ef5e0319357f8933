//! Deduplicating error sink for per-file conversion failures.
//!
//! A watch cycle reprocesses every file, so a persistently-bad file would
//! produce an identical log line every few seconds forever. The sink keys
//! failures by (path, rendered cause) and emits each distinct pair exactly
//! once: through `tracing::error!` and, when configured, as a line appended
//! to the error-log file.
//!
//! A file that later starts failing *differently* (new cause) is logged
//! again - the key is the pair, not the path.

use std::fs::OpenOptions;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use tracing::{error, trace, warn};

use dc_core::FxHashSet;
use dc_format::ConvertError;

/// Records per-file conversion failures, once per distinct (path, cause).
///
/// # Thread Safety
///
/// `ErrorSink` is `Send + Sync`; the dispatcher's write phase calls
/// [`report`](Self::report) from a single thread today, but nothing here
/// depends on that.
///
/// # Examples
///
/// ```
/// use dc_pipeline::ErrorSink;
/// use dc_format::ConvertError;
/// use camino::Utf8Path;
///
/// let sink = ErrorSink::new(None);
/// let path = Utf8Path::new("uploads/broken.csv");
///
/// assert!(sink.report(path, &ConvertError::Unrecognized));  // logged
/// assert!(!sink.report(path, &ConvertError::Unrecognized)); // suppressed
/// assert_eq!(sink.distinct_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ErrorSink {
    /// Optional error-log file; appended to, created on first use.
    log_path: Option<Utf8PathBuf>,

    /// Distinct (path, rendered error) pairs already reported.
    seen: Mutex<FxHashSet<(Utf8PathBuf, String)>>,
}

impl ErrorSink {
    /// Creates a sink that appends to the given error-log file.
    ///
    /// `None` disables file logging; failures still reach tracing.
    #[must_use]
    pub fn new(log_path: Option<Utf8PathBuf>) -> Self {
        Self {
            log_path,
            seen: Mutex::new(FxHashSet::default()),
        }
    }

    /// Reports a conversion failure for a file.
    ///
    /// Returns `true` if this (path, cause) pair was newly logged, `false`
    /// if it had been reported before and was suppressed.
    pub fn report(&self, path: &Utf8Path, cause: &ConvertError) -> bool {
        let rendered = cause.to_string();

        {
            let mut seen = self.seen.lock();
            if !seen.insert((path.to_owned(), rendered.clone())) {
                trace!(path = %path, "Suppressed repeated conversion error");
                return false;
            }
        }

        error!(path = %path, error = %rendered, "Conversion failed");

        if let Some(log_path) = &self.log_path {
            if let Err(io_error) = append_line(log_path, path, &rendered) {
                warn!(
                    log = %log_path,
                    error = %io_error,
                    "Failed to append to error log"
                );
            }
        }

        true
    }

    /// Returns the number of distinct failures reported so far.
    #[must_use]
    pub fn distinct_count(&self) -> usize {
        self.seen.lock().len()
    }

    /// Forgets all previously reported failures.
    ///
    /// After this, every failure logs again as if first seen.
    pub fn clear(&self) {
        self.seen.lock().clear();
    }

    /// Returns the configured error-log path, if any.
    #[must_use]
    pub fn log_path(&self) -> Option<&Utf8Path> {
        self.log_path.as_deref()
    }
}

/// Appends one formatted error line to the log file, creating it if needed.
fn append_line(log_path: &Utf8Path, path: &Utf8Path, rendered: &str) -> std::io::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent.as_std_path())?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path.as_std_path())?;
    writeln!(file, "Error processing {path}: {rendered}")
}
