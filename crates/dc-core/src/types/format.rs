//! Source format classification.

use serde::{Deserialize, Serialize};

/// The format assigned to an input stream by the detector.
///
/// Detection is advisory: a stream classified as [`SourceFormat::Json`] may
/// still end up parsed as CSV if the JSON reader rejects it. [`Unknown`]
/// means no reader is expected to succeed.
///
/// # Examples
///
/// ```
/// use dc_core::SourceFormat;
///
/// assert_eq!(SourceFormat::Csv.label(), "csv");
/// assert!(SourceFormat::Spreadsheet.is_tabular());
/// assert!(!SourceFormat::Json.is_tabular());
/// ```
///
/// [`Unknown`]: SourceFormat::Unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// JSON text (first non-whitespace byte is `{` or `[`).
    Json,
    /// Delimited text with a sniffable dialect.
    Csv,
    /// Zip-container spreadsheet (leading `PK` magic).
    Spreadsheet,
    /// No format could be established.
    Unknown,
}

impl SourceFormat {
    /// Returns the lowercase label for this format.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Spreadsheet => "spreadsheet",
            Self::Unknown => "unknown",
        }
    }

    /// Returns `true` if this format parses into a [`Table`](super::Table)
    /// rather than an arbitrary JSON value.
    #[must_use]
    pub const fn is_tabular(self) -> bool {
        matches!(self, Self::Csv | Self::Spreadsheet)
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
