//! Format detection, readers, and JSON serialization for dataconv.
//!
//! This crate turns a raw byte stream - a file on disk or an in-memory
//! buffer - into canonical JSON text. It is pure: nothing here writes to
//! disk or holds state between calls, which is what lets the pipeline crate
//! run it from any dispatcher and the tests run it without a filesystem.
//!
//! # Overview
//!
//! The main entry point is [`FileConverter`], which composes:
//!
//! - [`detect_format`]: byte-prefix and content sniffing (JSON / CSV /
//!   spreadsheet / unknown)
//! - the three readers: JSON ([`read_json_value`]), CSV
//!   ([`read_csv_table`] with a sniffed [`Dialect`]), and spreadsheet
//!   ([`read_sheet_table`])
//! - [`to_json_text`]: rendering the resulting [`Payload`](dc_core::Payload)
//!   back to JSON text
//!
//! # Architecture
//!
//! ```text
//! FileConverter
//!     │
//!     ├── "PK" magic? ──────► spreadsheet reader (calamine) ──► Table
//!     │
//!     └── decode (encoding_rs)
//!             │
//!             ├── '{' / '[' ──► JSON reader (serde_json) ──► Mapping
//!             │                     │ (on failure)
//!             │                     ▼
//!             ├── dialect sniff ──► CSV reader (csv crate) ──► Table
//!             │
//!             └── no dialect ──► Unrecognized
//!
//! Payload ──► serializer ──► JSON text
//! ```
//!
//! Detection is advisory: a stream whose first byte says "JSON" but whose
//! body fails the JSON reader is retried as CSV before the converter gives
//! up, because real upload directories are full of mislabeled files.
//!
//! # Example
//!
//! ```
//! use dc_format::FileConverter;
//!
//! let converter = FileConverter::new(None)?; // UTF-8
//! let json = converter.convert_bytes(b"id,amount\n1,10\n2,20\n")?;
//! assert!(json.contains("\"id\""));
//! # Ok::<(), dc_format::ConvertError>(())
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod convert;
mod decode;
mod detect;
mod error;
mod reader;
mod serialize;

pub use convert::FileConverter;
pub use decode::{decode_text, resolve_encoding};
pub use detect::{SPREADSHEET_MAGIC, detect_format};
pub use error::ConvertError;
pub use reader::csv::{Dialect, read_table as read_csv_table, sniff_dialect};
pub use reader::json::read_value as read_json_value;
pub use reader::sheet::read_table as read_sheet_table;
pub use serialize::to_json_text;
