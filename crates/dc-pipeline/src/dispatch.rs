//! Worker dispatch for conversion batches.
//!
//! The [`Dispatcher`] takes the file list for one cycle and produces one
//! outcome per file, under the configured [`ExecMode`]:
//!
//! - [`ExecMode::Sequential`] runs inline on the calling thread, in input
//!   order - the deterministic mode tests rely on.
//! - [`ExecMode::Threaded`] fans out over rayon, optionally on a private
//!   bounded pool.
//! - [`ExecMode::Multiprocess`] spawns one short-lived worker process per
//!   file (in bounded waves), re-invoking this binary's hidden `worker`
//!   subcommand. Outcomes travel back as a JSON [`WorkerReport`] on the
//!   child's stdout.
//!
//! Whatever the mode, `run_batch` returns only after every job in the
//! batch has resolved. That barrier is what lets the walker run its write
//! phase strictly after conversion, and the watcher start cycle N+1 only
//! once cycle N has fully settled.

use std::io;
use std::process::{Child, Command, Stdio};

use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use dc_core::{ConvertConfig, ExecMode, SourceFormat};
use dc_format::{ConvertError, FileConverter};

/// One conversion outcome per submitted path.
pub type BatchOutcome = Vec<(Utf8PathBuf, Result<String, ConvertError>)>;

/// Executes conversion batches under a configurable execution mode.
///
/// # Examples
///
/// ```
/// use dc_core::ExecMode;
/// use dc_pipeline::Dispatcher;
///
/// let dispatcher = Dispatcher::new(ExecMode::Threaded).with_pool_size(4);
/// assert_eq!(dispatcher.mode(), ExecMode::Threaded);
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    /// How jobs are scheduled.
    mode: ExecMode,
    /// Worker bound for threaded and multiprocess modes.
    /// `None` means all available cores.
    pool_size: Option<usize>,
    /// Override for the multiprocess worker command line.
    /// `None` re-invokes the current executable's `worker` subcommand.
    worker_command: Option<Vec<String>>,
}

impl Dispatcher {
    /// Creates a dispatcher for the given execution mode.
    #[must_use]
    pub const fn new(mode: ExecMode) -> Self {
        Self {
            mode,
            pool_size: None,
            worker_command: None,
        }
    }

    /// Creates a dispatcher from a [`ConvertConfig`].
    #[must_use]
    pub fn from_config(config: &ConvertConfig) -> Self {
        Self {
            mode: config.mode,
            pool_size: config.pool_size,
            worker_command: None,
        }
    }

    /// Bounds the number of parallel workers.
    #[must_use]
    pub const fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = Some(pool_size);
        self
    }

    /// Overrides the worker command line for multiprocess mode.
    ///
    /// The first element is the program; remaining elements are leading
    /// arguments. The job's source path and `--encoding <label>` are
    /// appended per invocation.
    #[must_use]
    pub fn with_worker_command(mut self, command: Vec<String>) -> Self {
        self.worker_command = Some(command);
        self
    }

    /// Returns the configured execution mode.
    #[must_use]
    pub const fn mode(&self) -> ExecMode {
        self.mode
    }

    /// Runs one batch of conversion jobs and collects every outcome.
    ///
    /// Returns one `(path, outcome)` pair per input path. The call returns
    /// only after all jobs have resolved, success or failure - callers may
    /// treat the return as a synchronization barrier.
    #[must_use]
    pub fn run_batch(&self, converter: &FileConverter, paths: &[Utf8PathBuf]) -> BatchOutcome {
        debug!(
            mode = %self.mode,
            jobs = paths.len(),
            "Dispatching conversion batch"
        );

        match self.mode {
            ExecMode::Sequential => self.run_sequential(converter, paths),
            ExecMode::Threaded => self.run_threaded(converter, paths),
            ExecMode::Multiprocess => self.run_multiprocess(converter, paths),
        }
    }

    /// Runs jobs inline, in input order.
    #[allow(clippy::unused_self)] // Signature kept parallel to the other modes
    fn run_sequential(&self, converter: &FileConverter, paths: &[Utf8PathBuf]) -> BatchOutcome {
        paths
            .iter()
            .map(|path| (path.clone(), converter.convert_path(path)))
            .collect()
    }

    /// Runs jobs on rayon, optionally on a private bounded pool.
    fn run_threaded(&self, converter: &FileConverter, paths: &[Utf8PathBuf]) -> BatchOutcome {
        let convert_all = || {
            paths
                .par_iter()
                .map(|path| (path.clone(), converter.convert_path(path)))
                .collect()
        };

        match self.pool_size {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(convert_all),
                Err(build_error) => {
                    warn!(
                        error = %build_error,
                        "Could not build bounded thread pool, using global pool"
                    );
                    convert_all()
                }
            },
            None => convert_all(),
        }
    }

    /// Runs jobs as worker processes in bounded waves.
    fn run_multiprocess(&self, converter: &FileConverter, paths: &[Utf8PathBuf]) -> BatchOutcome {
        let wave = self.pool_size.unwrap_or_else(default_parallelism).max(1);
        let encoding = converter.encoding_name();
        let mut outcomes = Vec::with_capacity(paths.len());

        for chunk in paths.chunks(wave) {
            // Spawn the whole wave before waiting on any of it.
            let children: Vec<(Utf8PathBuf, io::Result<Child>)> = chunk
                .iter()
                .map(|path| (path.clone(), self.spawn_worker(path, encoding)))
                .collect();

            for (path, spawned) in children {
                let outcome = match spawned {
                    Ok(child) => collect_worker_outcome(child, &path),
                    Err(spawn_error) => Err(ConvertError::Io(spawn_error)),
                };
                outcomes.push((path, outcome));
            }
        }

        outcomes
    }

    /// Spawns one worker process for a single job.
    fn spawn_worker(&self, path: &Utf8Path, encoding: &str) -> io::Result<Child> {
        let mut command = match &self.worker_command {
            Some(parts) => {
                let mut iter = parts.iter();
                let program = iter.next().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "empty worker command")
                })?;
                let mut command = Command::new(program);
                command.args(iter);
                command
            }
            None => {
                let mut command = Command::new(std::env::current_exe()?);
                command.arg("worker");
                command
            }
        };

        command
            .arg(path.as_str())
            .arg("--encoding")
            .arg(encoding)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        command.spawn()
    }
}

/// Waits for a worker process and decodes its report.
fn collect_worker_outcome(child: Child, path: &Utf8Path) -> Result<String, ConvertError> {
    let output = child.wait_with_output().map_err(ConvertError::Io)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConvertError::Io(io::Error::other(format!(
            "worker for {path} exited with {}: {}",
            output.status,
            stderr.trim()
        ))));
    }

    let report: WorkerReport = serde_json::from_slice(&output.stdout)
        .map_err(|e| ConvertError::Io(io::Error::other(format!("invalid worker report: {e}"))))?;

    report.into_outcome(path)
}

/// Number of workers when no pool size is configured.
fn default_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Failure category carried in a [`WorkerReport`].
///
/// Mirrors the [`ConvertError`] taxonomy closely enough for the parent
/// process to rebuild a typed error from a child's report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerErrorKind {
    /// Source path vanished before the worker could open it.
    NotFound,
    /// Input bytes did not decode with the configured encoding.
    Decode,
    /// A matched reader rejected the content.
    Structural,
    /// No format could be established.
    Unrecognized,
    /// Everything else (read failures, worker-side config problems).
    Io,
}

/// The JSON envelope a multiprocess worker prints on stdout.
///
/// # Examples
///
/// ```
/// use dc_pipeline::WorkerReport;
/// use camino::Utf8Path;
///
/// let report = WorkerReport::success("{\"a\":1}".to_owned());
/// let outcome = report.into_outcome(Utf8Path::new("a.json"));
/// assert_eq!(outcome.unwrap(), "{\"a\":1}");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    /// Whether the conversion succeeded.
    pub ok: bool,

    /// Converted JSON text (present when `ok`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Failure category (present when not `ok`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<WorkerErrorKind>,

    /// Format whose reader failed, for structural errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<SourceFormat>,

    /// Human-readable failure detail. For decode failures this is the
    /// encoding name, so the error reconstructs faithfully.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WorkerReport {
    /// Builds a success report.
    #[must_use]
    pub fn success(output: String) -> Self {
        Self {
            ok: true,
            output: Some(output),
            kind: None,
            format: None,
            message: None,
        }
    }

    /// Builds a failure report from a conversion error.
    #[must_use]
    pub fn failure(error: &ConvertError) -> Self {
        let (kind, format, message) = match error {
            ConvertError::NotFound(path) => {
                (WorkerErrorKind::NotFound, None, Some(path.to_string()))
            }
            ConvertError::Decode { encoding } => {
                (WorkerErrorKind::Decode, None, Some(encoding.clone()))
            }
            ConvertError::Structural { format, reason } => (
                WorkerErrorKind::Structural,
                Some(*format),
                Some(reason.clone()),
            ),
            ConvertError::Unrecognized => (WorkerErrorKind::Unrecognized, None, None),
            ConvertError::UnknownEncoding(_) | ConvertError::Io(_) => {
                (WorkerErrorKind::Io, None, Some(error.to_string()))
            }
        };

        Self {
            ok: false,
            output: None,
            kind: Some(kind),
            format,
            message,
        }
    }

    /// Rebuilds the conversion outcome this report describes.
    pub fn into_outcome(self, path: &Utf8Path) -> Result<String, ConvertError> {
        if self.ok {
            return self
                .output
                .ok_or_else(|| ConvertError::Io(io::Error::other("worker report missing output")));
        }

        let message = self
            .message
            .unwrap_or_else(|| "worker reported failure".to_owned());

        Err(match self.kind {
            Some(WorkerErrorKind::NotFound) => ConvertError::not_found(path),
            Some(WorkerErrorKind::Decode) => ConvertError::Decode { encoding: message },
            Some(WorkerErrorKind::Structural) => {
                ConvertError::structural(self.format.unwrap_or(SourceFormat::Unknown), message)
            }
            Some(WorkerErrorKind::Unrecognized) => ConvertError::Unrecognized,
            Some(WorkerErrorKind::Io) | None => ConvertError::Io(io::Error::other(message)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_files(dir: &TempDir, files: &[(&str, &str)]) -> Vec<Utf8PathBuf> {
        files
            .iter()
            .map(|(name, contents)| {
                let path = dir.path().join(name);
                fs::write(&path, contents).unwrap();
                Utf8PathBuf::from_path_buf(path).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_sequential_batch() {
        let dir = TempDir::new().unwrap();
        let paths = write_files(
            &dir,
            &[
                ("good.csv", "a,b\n1,2\n"),
                ("bad.txt", "nothing structured here"),
            ],
        );

        let converter = FileConverter::new(None).unwrap();
        let outcomes = Dispatcher::new(ExecMode::Sequential).run_batch(&converter, &paths);

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].1.is_ok());
        assert!(matches!(outcomes[1].1, Err(ConvertError::Unrecognized)));
    }

    #[test]
    fn test_sequential_preserves_input_order() {
        let dir = TempDir::new().unwrap();
        let paths = write_files(
            &dir,
            &[("1.csv", "a,b\n1,2\n"), ("2.csv", "a,b\n3,4\n"), ("3.csv", "a,b\n5,6\n")],
        );

        let converter = FileConverter::new(None).unwrap();
        let outcomes = Dispatcher::new(ExecMode::Sequential).run_batch(&converter, &paths);

        let returned: Vec<_> = outcomes.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(returned, paths);
    }

    #[test]
    fn test_threaded_batch_collects_all_outcomes() {
        let dir = TempDir::new().unwrap();
        let paths = write_files(
            &dir,
            &[
                ("a.csv", "x,y\n1,2\n"),
                ("b.json", "{\"k\": 1}"),
                ("c.txt", "unstructured"),
            ],
        );

        let converter = FileConverter::new(None).unwrap();
        let dispatcher = Dispatcher::new(ExecMode::Threaded).with_pool_size(2);
        let outcomes = dispatcher.run_batch(&converter, &paths);

        assert_eq!(outcomes.len(), 3);
        let failures = outcomes.iter().filter(|(_, r)| r.is_err()).count();
        assert_eq!(failures, 1);
    }

    #[test]
    fn test_batch_with_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut paths = write_files(&dir, &[("here.csv", "a,b\n1,2\n")]);
        paths.push(Utf8PathBuf::from_path_buf(dir.path().join("gone.csv")).unwrap());

        let converter = FileConverter::new(None).unwrap();
        let outcomes = Dispatcher::new(ExecMode::Sequential).run_batch(&converter, &paths);

        assert!(outcomes[0].1.is_ok());
        assert!(matches!(outcomes[1].1, Err(ConvertError::NotFound(_))));
    }

    #[test]
    fn test_worker_report_success_roundtrip() {
        let report = WorkerReport::success("{}".to_owned());
        let json = serde_json::to_string(&report).unwrap();
        let parsed: WorkerReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
        assert_eq!(parsed.into_outcome(Utf8Path::new("x")).unwrap(), "{}");
    }

    #[test]
    fn test_worker_report_structural_roundtrip() {
        let original = ConvertError::structural(SourceFormat::Csv, "ragged row");
        let report = WorkerReport::failure(&original);
        let json = serde_json::to_string(&report).unwrap();
        let parsed: WorkerReport = serde_json::from_str(&json).unwrap();

        let rebuilt = parsed.into_outcome(Utf8Path::new("x.csv")).unwrap_err();
        assert!(matches!(
            rebuilt,
            ConvertError::Structural {
                format: SourceFormat::Csv,
                ..
            }
        ));
        assert!(rebuilt.to_string().contains("ragged row"));
    }

    #[test]
    fn test_worker_report_not_found_roundtrip() {
        let original = ConvertError::not_found("gone.csv");
        let report = WorkerReport::failure(&original);
        let rebuilt = report.into_outcome(Utf8Path::new("gone.csv")).unwrap_err();
        assert!(matches!(rebuilt, ConvertError::NotFound(_)));
    }

    #[test]
    fn test_worker_report_decode_keeps_encoding() {
        let original = ConvertError::Decode {
            encoding: "windows-1252".to_owned(),
        };
        let report = WorkerReport::failure(&original);
        let rebuilt = report.into_outcome(Utf8Path::new("x")).unwrap_err();
        assert!(rebuilt.to_string().contains("windows-1252"));
    }

    #[test]
    fn test_worker_report_unrecognized_roundtrip() {
        let report = WorkerReport::failure(&ConvertError::Unrecognized);
        let rebuilt = report.into_outcome(Utf8Path::new("x")).unwrap_err();
        assert!(matches!(rebuilt, ConvertError::Unrecognized));
    }

    #[test]
    fn test_multiprocess_with_bad_worker_program() {
        let dir = TempDir::new().unwrap();
        let paths = write_files(&dir, &[("a.csv", "x,y\n1,2\n")]);

        let converter = FileConverter::new(None).unwrap();
        let dispatcher = Dispatcher::new(ExecMode::Multiprocess)
            .with_worker_command(vec!["/no/such/worker/binary".to_owned()]);
        let outcomes = dispatcher.run_batch(&converter, &paths);

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0].1, Err(ConvertError::Io(_))));
    }
}
