//! Directory traversal and the walk-convert-write cycle.
//!
//! [`DirectoryWalker`] owns everything filesystem-shaped about one cycle:
//! which files are eligible, where their converted output lands, and the
//! write phase after the dispatcher's batch barrier. Conversion itself
//! stays in `dc-format`; job scheduling stays in the dispatcher.
//!
//! # Eligibility
//!
//! Hidden entries (names starting with a dot) are skipped, files and
//! directories alike. With recursion off, only the top level of the source
//! directory is considered.
//!
//! # Output mapping
//!
//! Outputs mirror the source-relative location under the target root, with
//! `.json` appended after the original extension:
//!
//! ```text
//! <source>/sub/report.csv  ->  <target>/sub/report.csv.json
//! ```

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use tracing::{debug, info, trace};

use dc_core::WalkConfig;
use dc_format::{ConvertError, FileConverter};

use crate::dispatch::Dispatcher;
use crate::error::PipelineError;
use crate::sink::ErrorSink;
use crate::stats::CycleSnapshot;

/// Walks a source directory and mirrors converted output to a target tree.
///
/// # Design
///
/// Uses the "collect-then-dispatch" pattern: the walk collects all eligible
/// paths first (single-threaded, I/O bound), the dispatcher then processes
/// them under its configured execution mode, and the write phase runs last,
/// strictly after the whole batch has resolved.
///
/// # Examples
///
/// ```no_run
/// use dc_pipeline::DirectoryWalker;
/// use camino::Utf8Path;
///
/// let walker = DirectoryWalker::from_paths(
///     Utf8Path::new("uploads"),
///     Utf8Path::new("converted"),
///     true,
/// )?;
/// let paths = walker.collect_paths()?;
/// println!("found {} files", paths.len());
/// # Ok::<(), dc_pipeline::PipelineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    /// Root directory being scanned.
    source: Utf8PathBuf,
    /// Root of the mirrored output tree.
    target: Utf8PathBuf,
    /// Whether to descend into subdirectories.
    recursive: bool,
}

impl DirectoryWalker {
    /// Creates a walker from a [`WalkConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the source directory does not
    /// exist or is not a directory.
    pub fn new(config: &WalkConfig) -> Result<Self, PipelineError> {
        Self::from_paths(&config.source_dir, &config.target_dir, config.recursive)
    }

    /// Creates a walker from explicit paths.
    ///
    /// The target directory is created lazily during the write phase; only
    /// the source is validated here.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the source directory does not
    /// exist or is not a directory.
    pub fn from_paths(
        source: &Utf8Path,
        target: &Utf8Path,
        recursive: bool,
    ) -> Result<Self, PipelineError> {
        if !source.exists() {
            return Err(PipelineError::config(format!(
                "source path does not exist: {source}"
            )));
        }
        if !source.is_dir() {
            return Err(PipelineError::config(format!(
                "source path is not a directory: {source}"
            )));
        }

        Ok(Self {
            source: source.to_owned(),
            target: target.to_owned(),
            recursive,
        })
    }

    /// Returns the source directory.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &Utf8Path {
        &self.source
    }

    /// Returns the target directory.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Utf8Path {
        &self.target
    }

    /// Returns whether subdirectories are scanned.
    #[inline]
    #[must_use]
    pub const fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Collects all eligible file paths under the source directory.
    ///
    /// Hidden entries are skipped; with recursion off, subdirectories are
    /// skipped entirely. Discovery order is filesystem-listing order and
    /// carries no guarantee.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Walk`] if traversal fails and
    /// [`PipelineError::NonUtf8Path`] for entries with non-UTF-8 names.
    pub fn collect_paths(&self) -> Result<Vec<Utf8PathBuf>, PipelineError> {
        let mut paths = Vec::new();

        for result in self.build_walker() {
            let entry = result?;

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let utf8_path = Utf8Path::from_path(path)
                .ok_or_else(|| PipelineError::NonUtf8Path(path.to_owned()))?;

            paths.push(utf8_path.to_owned());
        }

        Ok(paths)
    }

    /// Maps a source file to its mirrored output path.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dc_pipeline::DirectoryWalker;
    /// use camino::Utf8Path;
    ///
    /// let walker = DirectoryWalker::from_paths(
    ///     Utf8Path::new("uploads"),
    ///     Utf8Path::new("converted"),
    ///     true,
    /// )?;
    /// assert_eq!(
    ///     walker.output_path(Utf8Path::new("uploads/sub/data.csv")),
    ///     Utf8Path::new("converted/sub/data.csv.json"),
    /// );
    /// # Ok::<(), dc_pipeline::PipelineError>(())
    /// ```
    #[must_use]
    pub fn output_path(&self, source_file: &Utf8Path) -> Utf8PathBuf {
        let relative = source_file.strip_prefix(&self.source).unwrap_or(source_file);
        let mut output = self.target.join(relative);
        if let Some(name) = output.file_name() {
            let with_suffix = format!("{name}.json");
            output.set_file_name(with_suffix);
        }
        output
    }

    /// Runs one full walk-convert-write cycle.
    ///
    /// 1. Collects eligible paths.
    /// 2. Dispatches the batch and waits for every outcome (the barrier).
    /// 3. Writes successful conversions to their mirrored output paths,
    ///    creating parent directories on demand.
    /// 4. Routes failures - conversion and output-write alike - through
    ///    the sink. A failed file never aborts the batch.
    ///
    /// # Errors
    ///
    /// Returns an error only for directory-level problems (the walk
    /// itself failing). Per-file failures are counted in the returned
    /// [`CycleSnapshot`] instead.
    pub fn convert_all(
        &self,
        dispatcher: &Dispatcher,
        converter: &FileConverter,
        sink: &ErrorSink,
    ) -> Result<CycleSnapshot, PipelineError> {
        let paths = self.collect_paths()?;
        debug!(
            source = %self.source,
            count = paths.len(),
            "Collected convertible files"
        );

        let outcomes = dispatcher.run_batch(converter, &paths);

        let mut converted: u64 = 0;
        let mut failed: u64 = 0;

        for (path, outcome) in outcomes {
            match outcome {
                Ok(json) => match self.write_output(&path, &json) {
                    Ok(output) => {
                        converted += 1;
                        trace!(source = %path, output = %output, "Wrote converted file");
                    }
                    Err(write_error) => {
                        failed += 1;
                        sink.report(&path, &ConvertError::Io(write_error));
                    }
                },
                Err(conversion_error) => {
                    failed += 1;
                    sink.report(&path, &conversion_error);
                }
            }
        }

        let snapshot = CycleSnapshot {
            discovered: paths.len() as u64,
            converted,
            failed,
        };

        info!(
            source = %self.source,
            discovered = snapshot.discovered,
            converted = snapshot.converted,
            failed = snapshot.failed,
            "Cycle completed"
        );

        Ok(snapshot)
    }

    /// Writes one converted file, creating parent directories as needed.
    fn write_output(&self, source_file: &Utf8Path, json: &str) -> std::io::Result<Utf8PathBuf> {
        let output = self.output_path(source_file);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent.as_std_path())?;
        }
        fs::write(output.as_std_path(), json)?;
        Ok(output)
    }

    /// Builds the ignore walker with configured settings.
    fn build_walker(&self) -> ignore::Walk {
        let mut builder = WalkBuilder::new(&self.source);
        builder
            // Only the hidden-entry filter; gitignore semantics are not
            // part of the eligibility contract.
            .standard_filters(false)
            .hidden(true)
            .follow_links(false)
            .require_git(false)
            .threads(1);

        if !self.recursive {
            // Depth 1 = direct children of the source root only.
            builder.max_depth(Some(1));
        }

        builder.build()
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

    fn write(base: &Utf8Path, rel: &str, contents: &str) {
        let path = base.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent.as_std_path()).unwrap();
        }
        fs::write(path.as_std_path(), contents).unwrap();
    }

    fn run_cycle(fx: &Fixture, recursive: bool, sink: &ErrorSink) -> CycleSnapshot {
        let walker = DirectoryWalker::from_paths(&fx.source, &fx.target, recursive).unwrap();
        let dispatcher = Dispatcher::new(ExecMode::Sequential);
        let converter = FileConverter::new(None).unwrap();
        walker.convert_all(&dispatcher, &converter, sink).unwrap()
    }

    #[test]
    fn test_missing_source_rejected() {
        let result = DirectoryWalker::from_paths(
            Utf8Path::new("/no/such/source"),
            Utf8Path::new("/tmp/out"),
            true,
        );
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_output_path_mirrors_and_appends_json() {
        let fx = fixture();
        let walker = DirectoryWalker::from_paths(&fx.source, &fx.target, true).unwrap();

        let input = fx.source.join("sub/dir/file.csv");
        assert_eq!(
            walker.output_path(&input),
            fx.target.join("sub/dir/file.csv.json")
        );
    }

    #[test]
    fn test_output_path_extensionless() {
        let fx = fixture();
        let walker = DirectoryWalker::from_paths(&fx.source, &fx.target, true).unwrap();

        let input = fx.source.join("Makefile");
        assert_eq!(walker.output_path(&input), fx.target.join("Makefile.json"));
    }

    #[test]
    fn test_collect_skips_hidden_files() {
        let fx = fixture();
        write(&fx.source, "visible.csv", "a,b\n1,2\n");
        write(&fx.source, ".hidden.csv", "a,b\n1,2\n");
        write(&fx.source, ".hiddendir/inner.csv", "a,b\n1,2\n");

        let walker = DirectoryWalker::from_paths(&fx.source, &fx.target, true).unwrap();
        let paths = walker.collect_paths().unwrap();

        assert_eq!(paths.len(), 1);
        assert!(paths[0].as_str().ends_with("visible.csv"));
    }

    #[test]
    fn test_collect_respects_recursion_flag() {
        let fx = fixture();
        write(&fx.source, "top.csv", "a,b\n1,2\n");
        write(&fx.source, "sub/nested.csv", "a,b\n1,2\n");

        let walker = DirectoryWalker::from_paths(&fx.source, &fx.target, false).unwrap();
        let flat = walker.collect_paths().unwrap();
        assert_eq!(flat.len(), 1);

        let walker = DirectoryWalker::from_paths(&fx.source, &fx.target, true).unwrap();
        let deep = walker.collect_paths().unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn test_sales_example_end_to_end() {
        let fx = fixture();
        write(&fx.source, "sales.csv", "id,amount\n1,10\n2,20\n");

        let sink = ErrorSink::new(None);
        let snapshot = run_cycle(&fx, true, &sink);
        assert_eq!(snapshot.discovered, 1);
        assert_eq!(snapshot.converted, 1);
        assert_eq!(snapshot.failed, 0);

        let output = fx.target.join("sales.csv.json");
        let contents = fs::read_to_string(output.as_std_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": [1, 2], "amount": [10, 20]})
        );
    }

    #[test]
    fn test_bad_file_does_not_abort_batch() {
        let fx = fixture();
        write(&fx.source, "good.csv", "id,amount\n1,10\n");
        write(&fx.source, "corrupt.xlsx", "PK\x03\x04 not really a workbook");

        let sink = ErrorSink::new(None);
        let snapshot = run_cycle(&fx, true, &sink);

        assert_eq!(snapshot.discovered, 2);
        assert_eq!(snapshot.converted, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(sink.distinct_count(), 1);

        // Exactly one output file: the valid one.
        assert!(fx.target.join("good.csv.json").exists());
        assert!(!fx.target.join("corrupt.xlsx.json").exists());
    }

    #[test]
    fn test_idempotent_across_cycles() {
        let fx = fixture();
        write(&fx.source, "sales.csv", "id,amount\n1,10\n2,20\n");

        let sink = ErrorSink::new(None);
        run_cycle(&fx, true, &sink);
        let first = fs::read(fx.target.join("sales.csv.json").as_std_path()).unwrap();

        run_cycle(&fx, true, &sink);
        let second = fs::read(fx.target.join("sales.csv.json").as_std_path()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_nested_output_mirrors_tree() {
        let fx = fixture();
        write(&fx.source, "a/b/data.csv", "x,y\n1,2\n");

        let sink = ErrorSink::new(None);
        run_cycle(&fx, true, &sink);

        assert!(fx.target.join("a/b/data.csv.json").exists());
    }

    #[test]
    fn test_persistent_failure_logged_once_across_cycles() {
        let fx = fixture();
        write(&fx.source, "corrupt.xlsx", "PK\x03\x04 still not a workbook");

        let sink = ErrorSink::new(None);
        for _ in 0..3 {
            let snapshot = run_cycle(&fx, true, &sink);
            assert_eq!(snapshot.failed, 1);
        }

        // Three cycles observed the same bad file; one distinct report.
        assert_eq!(sink.distinct_count(), 1);
    }
}
