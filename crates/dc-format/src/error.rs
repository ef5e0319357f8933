//! Error types for the dc-format crate.
//!
//! This module provides the [`ConvertError`] type covering every way a
//! single conversion can fail.

use camino::Utf8PathBuf;
use dc_core::SourceFormat;

/// Errors that can occur while converting one input stream to JSON.
///
/// # Error Recovery Strategy
///
/// Every variant is a per-file data error from the pipeline's point of view:
/// the walker logs it through the error sink and moves on to the next file.
/// None of them should abort a batch. [`ConvertError::UnknownEncoding`] is
/// the exception - it is raised once at converter construction, before any
/// file is touched.
///
/// # Examples
///
/// ```
/// use dc_format::ConvertError;
/// use dc_core::SourceFormat;
///
/// let err = ConvertError::structural(SourceFormat::Csv, "row 3 has 2 fields, expected 3");
/// assert!(err.to_string().contains("csv"));
/// assert!(err.is_data_error());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The source path does not exist at conversion time.
    ///
    /// Typically the file was removed between directory listing and open.
    #[error("file not found: {0}")]
    NotFound(Utf8PathBuf),

    /// The byte buffer could not be decoded with the configured encoding.
    #[error("could not decode input as {encoding}")]
    Decode {
        /// Name of the encoding that rejected the buffer.
        encoding: String,
    },

    /// A reader matched the detected format but failed to parse the content.
    ///
    /// Covers malformed JSON (after the CSV fallback also failed to sniff),
    /// CSV structural errors, and corrupt spreadsheet containers.
    #[error("malformed {format} content: {reason}")]
    Structural {
        /// The format whose reader failed.
        format: SourceFormat,
        /// Parser-provided description of the failure.
        reason: String,
    },

    /// No format could be established and no reader succeeded.
    #[error("could not guess data format")]
    Unrecognized,

    /// The configured encoding label is not a known encoding.
    #[error("unknown encoding label: {0}")]
    UnknownEncoding(String),

    /// An I/O error occurred while reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Creates a new [`ConvertError::Structural`] error.
    #[inline]
    pub fn structural(format: SourceFormat, reason: impl Into<String>) -> Self {
        Self::Structural {
            format,
            reason: reason.into(),
        }
    }

    /// Creates a new [`ConvertError::NotFound`] error.
    #[inline]
    pub fn not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Returns `true` if this error describes bad input data rather than an
    /// environment or configuration problem.
    ///
    /// Data errors are the expected steady-state failures of a watch cycle;
    /// they are logged once and the file is skipped.
    #[inline]
    #[must_use]
    pub const fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::Structural { .. } | Self::Unrecognized
        )
    }

    /// Returns the source path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::NotFound(path) => Some(path),
            _ => None,
        }
    }
}
