//! CLI entry point for the dataconv tool.
//!
//! This binary converts JSON/CSV/spreadsheet files into canonical JSON,
//! either one file at a time, as a one-shot directory pass, or as a
//! long-lived directory watcher.
//!
//! # Usage
//!
//! ```bash
//! # Convert one file to stdout
//! dataconv convert uploads/sales.csv
//!
//! # One-shot directory pass
//! dataconv run --source uploads --target converted
//!
//! # Watch a directory until interrupted
//! dataconv watch --source uploads --target converted --interval 5
//! ```
//!
//! Every path and mode option can also come from the environment
//! (`IO_SOURCE_DIRECTORY`, `IO_TARGET_DIRECTORY`, `IO_ERROR_LOG_PATH`,
//! `IO_ENCODING`, `IO_EXEC_MODE`, `IO_POOL_SIZE`, `IO_RECURSIVE`,
//! `IO_POLL_INTERVAL`).

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use dc_core::{Config, ExecMode};
use dc_format::FileConverter;
use dc_pipeline::{
    CycleSnapshot, DirectoryWalker, DirectoryWatcher, Dispatcher, ErrorSink, WatchUpdate,
    WatcherRegistry, WorkerReport,
};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Directory-watching parallel file-to-JSON converter.
///
/// Sniffs the format of input files (JSON, CSV, or zip-container
/// spreadsheet), converts them to canonical JSON, and mirrors the results
/// into a target directory tree.
#[derive(Parser)]
#[command(name = "dataconv", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Source directory to scan for convertible files.
    #[arg(short, long, global = true, env = "IO_SOURCE_DIRECTORY")]
    source: Option<Utf8PathBuf>,

    /// Target directory for the mirrored output tree.
    #[arg(short, long, global = true, env = "IO_TARGET_DIRECTORY")]
    target: Option<Utf8PathBuf>,

    /// Error log file for per-file conversion failures.
    #[arg(long, global = true, env = "IO_ERROR_LOG_PATH")]
    error_log: Option<Utf8PathBuf>,

    /// Text encoding for decoding input files (default: UTF-8).
    #[arg(short, long, global = true, env = "IO_ENCODING")]
    encoding: Option<String>,

    /// Execution mode for conversion batches.
    #[arg(short, long, global = true, env = "IO_EXEC_MODE", default_value_t = ExecMode::Threaded)]
    mode: ExecMode,

    /// Maximum number of parallel workers (default: all cores).
    #[arg(long, global = true, env = "IO_POOL_SIZE")]
    pool_size: Option<usize>,

    /// Whether to descend into subdirectories.
    #[arg(
        long,
        global = true,
        env = "IO_RECURSIVE",
        default_value_t = true,
        action = ArgAction::Set
    )]
    recursive: bool,

    /// Seconds between watch cycles.
    #[arg(long, global = true, env = "IO_POLL_INTERVAL", default_value_t = 5)]
    interval: u64,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert a single file and print (or write) the JSON result.
    Convert {
        /// File to convert.
        file: Utf8PathBuf,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },

    /// Run one walk-convert-write pass over the source directory.
    Run,

    /// Watch the source directory, converting on a fixed interval.
    Watch,

    /// Convert one file and print a machine-readable report envelope.
    ///
    /// Backend for multiprocess dispatch; not intended for direct use.
    #[command(hide = true)]
    Worker {
        /// File to convert.
        file: Utf8PathBuf,

        /// Text encoding passed down by the parent process.
        #[arg(long)]
        encoding: Option<String>,
    },
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default. Logs
/// go to stderr so the `convert` and `worker` outputs on stdout stay
/// machine-readable.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},ignore=warn,mio=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds a [`Config`] from CLI arguments.
///
/// # Errors
///
/// Returns an error if validation fails.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = Config::default();

    if let Some(source) = &cli.source {
        config.walk.source_dir.clone_from(source);
    }
    if let Some(target) = &cli.target {
        config.walk.target_dir.clone_from(target);
    }
    config.walk.recursive = cli.recursive;

    config.convert.encoding.clone_from(&cli.encoding);
    config.convert.mode = cli.mode;
    config.convert.pool_size = cli.pool_size;

    config.watch.poll_interval_secs = cli.interval;
    config.watch.recursive = cli.recursive;

    config.error_log.clone_from(&cli.error_log);

    config.validate()?;
    Ok(config)
}

/// Validates that a directory argument exists and is a directory.
fn validate_dir(path: &Utf8PathBuf, label: &str) -> color_eyre::Result<()> {
    if !path.exists() {
        return Err(color_eyre::eyre::eyre!(
            "{label} path does not exist: {path}"
        ));
    }

    if !path.is_dir() {
        return Err(color_eyre::eyre::eyre!(
            "{label} path is not a directory: {path}"
        ));
    }

    Ok(())
}

/// Assembles the pipeline pieces shared by `run` and `watch`.
fn build_pipeline(
    config: &Config,
) -> color_eyre::Result<(DirectoryWalker, Dispatcher, FileConverter, Arc<ErrorSink>)> {
    validate_dir(&config.walk.source_dir, "source")?;

    let walker = DirectoryWalker::new(&config.walk)?;
    let dispatcher = Dispatcher::from_config(&config.convert);
    let converter = FileConverter::from_config(&config.convert)?;
    let sink = Arc::new(ErrorSink::new(config.error_log.clone()));

    Ok((walker, dispatcher, converter, sink))
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Converts a single file to stdout or an output file.
fn run_convert(
    cli: &Cli,
    file: &Utf8PathBuf,
    output: Option<&Utf8PathBuf>,
) -> color_eyre::Result<()> {
    let converter = FileConverter::new(cli.encoding.as_deref())?;
    let json = converter.convert_path(file)?;

    if let Some(output_path) = output {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }
        std::fs::write(output_path.as_std_path(), &json)?;
        info!(path = %output_path, "Converted file written");
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{json}")?;
    }

    Ok(())
}

/// Runs one walk-convert-write pass and prints a summary.
fn run_once(config: &Config) -> color_eyre::Result<()> {
    info!(source = %config.walk.source_dir, "Starting one-shot conversion");

    let (walker, dispatcher, converter, sink) = build_pipeline(config)?;
    let snapshot = walker.convert_all(&dispatcher, &converter, &sink)?;

    print_cycle_summary(&snapshot);
    Ok(())
}

/// Watches the source directory until interrupted.
async fn run_watch(config: Config) -> color_eyre::Result<()> {
    info!(
        source = %config.walk.source_dir,
        interval = config.watch.poll_interval_secs,
        "Starting directory watcher"
    );

    let (walker, dispatcher, converter, sink) = build_pipeline(&config)?;
    let registry = WatcherRegistry::new();

    let mut watcher = DirectoryWatcher::start(
        walker,
        dispatcher,
        converter,
        sink,
        &config.watch,
        &registry,
    )
    .await?;

    // Drain per-cycle updates until an interrupt arrives.
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        loop {
            tokio::select! {
                update = watcher.recv() => match update {
                    Some(update) => print_watch_update(&update),
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Received interrupt, shutting down");
                    break;
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                    break;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        loop {
            tokio::select! {
                update = watcher.recv() => match update {
                    Some(update) => print_watch_update(&update),
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Received interrupt, shutting down");
                    break;
                }
            }
        }
    }

    let stats = watcher.stats();
    watcher.shutdown().await?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(handle);
    let _ = writeln!(
        handle,
        "Watched {} cycles: {} converted, {} failed",
        stats.cycles, stats.converted, stats.failed
    );

    Ok(())
}

/// Converts one file and prints the worker report envelope.
///
/// Always exits 0; the envelope carries success or failure. The parent
/// dispatcher treats a non-zero exit as a worker crash.
fn run_worker(file: &Utf8PathBuf, encoding: Option<&str>) -> color_eyre::Result<()> {
    let report = match FileConverter::new(encoding) {
        Ok(converter) => match converter.convert_path(file) {
            Ok(json) => WorkerReport::success(json),
            Err(error) => WorkerReport::failure(&error),
        },
        Err(error) => WorkerReport::failure(&error),
    };

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", serde_json::to_string(&report)?)?;

    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Prints a summary of one conversion cycle.
fn print_cycle_summary(snapshot: &CycleSnapshot) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Conversion Summary");
    let _ = writeln!(handle, "==================");
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Files discovered: {}", snapshot.discovered);
    let _ = writeln!(handle, "  Converted:      {}", snapshot.converted);
    let _ = writeln!(handle, "  Failed:         {}", snapshot.failed);
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Success rate: {:.1}%", snapshot.success_rate());
}

/// Prints one line per watch cycle.
fn print_watch_update(update: &WatchUpdate) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    match update {
        WatchUpdate::CycleComplete(snapshot) => {
            let _ = writeln!(
                handle,
                "cycle: discovered {}, converted {}, failed {}",
                snapshot.discovered, snapshot.converted, snapshot.failed
            );
        }
        WatchUpdate::CycleFailed { reason } => {
            let _ = writeln!(handle, "cycle failed: {reason}");
        }
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Install color-eyre first, before any potential panics.
    color_eyre::install()?;

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.no_color);

    match &cli.command {
        Commands::Convert { file, output } => run_convert(&cli, file, output.as_ref()),
        Commands::Run => {
            let config = build_config(&cli)?;
            run_once(&config)
        }
        Commands::Watch => {
            let config = build_config(&cli)?;
            run_watch(config).await
        }
        Commands::Worker { file, encoding } => run_worker(file, encoding.as_deref()),
    }
}
