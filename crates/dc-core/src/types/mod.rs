//! Domain types shared across the workspace.
//!
//! - [`SourceFormat`] - classification produced by the format detector
//! - [`Column`], [`Table`] - the tabular shape produced by the CSV and
//!   spreadsheet readers
//! - [`Payload`] - tagged union over the two shapes a reader can produce

mod format;
mod payload;

pub use format::SourceFormat;
pub use payload::{Column, Payload, Table};
