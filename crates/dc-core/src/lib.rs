//! Core types, configuration, and utilities for the dataconv tool.
//!
//! This crate provides the foundational pieces used across the workspace:
//!
//! - Configuration structures ([`Config`], [`ConvertConfig`], [`WalkConfig`],
//!   [`WatchConfig`]) with environment-overridable defaults
//! - The [`ConfigError`] type for configuration validation failures
//! - Domain types ([`SourceFormat`], [`Payload`], [`Table`], [`Column`])
//! - The [`ExecMode`] selector for the worker dispatcher
//! - Type aliases for `FxHashMap`/`FxHashSet` (faster than std)
//!
//! Nothing in this crate performs I/O; it is pure data shared by the
//! format, pipeline, and CLI crates.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod config;
mod error;
mod hash;
mod types;

pub use config::{Config, ConvertConfig, ExecMode, WalkConfig, WatchConfig};
pub use error::ConfigError;
pub use hash::{FxBuildHasher, FxHashMap, FxHashSet, fx_hash_map, fx_hash_set};
pub use types::{Column, Payload, SourceFormat, Table};
