//! Configuration structures for the dataconv tool.
//!
//! This module provides configuration types for all components of the
//! application:
//!
//! - [`ConvertConfig`] - Converter settings (encoding, execution mode, pool size)
//! - [`WalkConfig`] - Directory walker settings (source, target, recursion)
//! - [`WatchConfig`] - Directory watcher settings (poll interval, recursion)
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`] with values matching the
//! upload-conversion deployment. Every field can be overridden from the
//! environment through the CLI (`IO_SOURCE_DIRECTORY`, `IO_TARGET_DIRECTORY`,
//! `IO_ERROR_LOG_PATH`, `IO_ENCODING`, `IO_EXEC_MODE`, `IO_RECURSIVE`,
//! `IO_POLL_INTERVAL`).

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Execution mode for the worker dispatcher.
///
/// Selects how conversion jobs in a batch are scheduled.
///
/// # Examples
///
/// ```
/// use dc_core::ExecMode;
///
/// assert_eq!("threaded".parse::<ExecMode>(), Ok(ExecMode::Threaded));
/// assert_eq!(ExecMode::default(), ExecMode::Threaded);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecMode {
    /// Run every job inline on the calling thread. Deterministic; used in tests.
    Sequential,
    /// Run jobs on a bounded thread pool.
    #[default]
    Threaded,
    /// Run each job in a short-lived worker process.
    ///
    /// Trades inter-process serialization overhead for isolation of
    /// CPU-bound parsing.
    Multiprocess,
}

impl ExecMode {
    /// Returns the canonical lowercase label for this mode.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Threaded => "threaded",
            Self::Multiprocess => "multiprocess",
        }
    }
}

impl std::fmt::Display for ExecMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ExecMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(Self::Sequential),
            "threaded" => Ok(Self::Threaded),
            "multiprocess" => Ok(Self::Multiprocess),
            other => Err(format!(
                "unknown execution mode '{other}' (expected sequential, threaded, or multiprocess)"
            )),
        }
    }
}

/// Configuration for the file converter.
///
/// Controls text decoding and how conversion work is dispatched.
///
/// # Examples
///
/// ```
/// use dc_core::{ConvertConfig, ExecMode};
///
/// let config = ConvertConfig::default();
/// assert_eq!(config.encoding, None); // UTF-8
/// assert_eq!(config.mode, ExecMode::Threaded);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Text encoding label for decoding input bytes (e.g. `"utf-8"`,
    /// `"windows-1252"`). `None` means UTF-8.
    pub encoding: Option<String>,

    /// How conversion jobs are executed.
    pub mode: ExecMode,

    /// Maximum number of parallel workers.
    /// `None` means use all available CPU cores.
    pub pool_size: Option<usize>,
}

/// Configuration for the directory walker.
///
/// Controls which directory is scanned and where converted output lands.
///
/// # Examples
///
/// ```
/// use dc_core::WalkConfig;
///
/// let config = WalkConfig::default();
/// assert_eq!(config.source_dir, "input_and_output/uploads");
/// assert_eq!(config.target_dir, "input_and_output/converted");
/// assert!(config.recursive);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Root directory to scan for convertible files.
    pub source_dir: Utf8PathBuf,

    /// Root of the mirrored output tree.
    pub target_dir: Utf8PathBuf,

    /// Whether to descend into subdirectories.
    pub recursive: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            source_dir: Utf8PathBuf::from("input_and_output/uploads"),
            target_dir: Utf8PathBuf::from("input_and_output/converted"),
            recursive: true,
        }
    }
}

/// Configuration for the directory watcher.
///
/// # Examples
///
/// ```
/// use dc_core::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert_eq!(config.poll_interval_secs, 5);
/// assert!(config.recursive);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Seconds to sleep between watch cycles.
    pub poll_interval_secs: u64,

    /// Whether each cycle walks subdirectories recursively.
    pub recursive: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            recursive: true,
        }
    }
}

/// Root configuration for the dataconv tool.
///
/// Combines all component configurations into a single structure that can be
/// constructed programmatically or deserialized with partial overrides.
///
/// # Examples
///
/// ```
/// use dc_core::Config;
///
/// let config = Config::default();
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// let parsed: Config = serde_json::from_str(&json).unwrap();
/// assert_eq!(config, parsed);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Converter configuration.
    pub convert: ConvertConfig,

    /// Directory walker configuration.
    pub walk: WalkConfig,

    /// Directory watcher configuration.
    pub watch: WatchConfig,

    /// Destination for the deduplicated per-file error log.
    /// `None` disables file logging (errors still go to tracing).
    pub error_log: Option<Utf8PathBuf>,
}

impl Config {
    /// Validates the configuration, returning the first problem found.
    ///
    /// Checks that required paths are non-empty and numeric options are in
    /// range. Existence of the source directory is checked by the walker at
    /// startup, not here, because the watcher may legitimately be configured
    /// before the directory is created.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] or [`ConfigError::InvalidPath`]
    /// for the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.walk.source_dir.as_str().is_empty() {
            return Err(ConfigError::invalid_path(
                self.walk.source_dir.clone(),
                "source directory must not be empty",
            ));
        }

        if self.walk.target_dir.as_str().is_empty() {
            return Err(ConfigError::invalid_path(
                self.walk.target_dir.clone(),
                "target directory must not be empty",
            ));
        }

        if self.watch.poll_interval_secs == 0 {
            return Err(ConfigError::invalid_option(
                "poll_interval_secs",
                "must be at least 1 second",
            ));
        }

        if self.convert.pool_size == Some(0) {
            return Err(ConfigError::invalid_option(
                "pool_size",
                "must be at least 1 worker",
            ));
        }

        Ok(())
    }
}
