//! Format detection from leading bytes and content shape.
//!
//! Detection runs in a fixed order: spreadsheet magic first (the only check
//! that works on raw bytes), then text-based classification on the decoded
//! buffer. The result is advisory - see
//! [`FileConverter`](crate::FileConverter) for the fallback behavior when a
//! reader disagrees with the detector.

use encoding_rs::Encoding;

use dc_core::SourceFormat;

use crate::decode::decode_text;
use crate::error::ConvertError;
use crate::reader::csv::sniff_dialect;

/// Leading magic of a zip-based spreadsheet container.
pub const SPREADSHEET_MAGIC: &[u8; 2] = b"PK";

/// Classifies a byte stream as one of the supported input formats.
///
/// - Leading `PK` bytes classify as [`SourceFormat::Spreadsheet`] without
///   decoding.
/// - Otherwise the whole buffer is decoded with `encoding`; a first
///   non-whitespace `{` or `[` classifies as [`SourceFormat::Json`].
/// - Anything else is [`SourceFormat::Csv`] if a delimiter dialect can be
///   sniffed, [`SourceFormat::Unknown`] if not.
///
/// # Errors
///
/// Returns [`ConvertError::Decode`] if the buffer cannot be decoded. A
/// decode failure is a distinct outcome, not `Unknown`.
///
/// # Examples
///
/// ```
/// use dc_format::{detect_format, resolve_encoding};
/// use dc_core::SourceFormat;
///
/// let utf8 = resolve_encoding(None)?;
/// assert_eq!(detect_format(b"PK\x03\x04whatever", utf8)?, SourceFormat::Spreadsheet);
/// assert_eq!(detect_format(b"  {\"a\": 1}", utf8)?, SourceFormat::Json);
/// assert_eq!(detect_format(b"a,b\n1,2\n", utf8)?, SourceFormat::Csv);
/// assert_eq!(detect_format(b"just a sentence", utf8)?, SourceFormat::Unknown);
/// # Ok::<(), dc_format::ConvertError>(())
/// ```
pub fn detect_format(
    bytes: &[u8],
    encoding: &'static Encoding,
) -> Result<SourceFormat, ConvertError> {
    if bytes.starts_with(SPREADSHEET_MAGIC) {
        return Ok(SourceFormat::Spreadsheet);
    }

    let text = decode_text(bytes, encoding)?;
    Ok(classify_text(&text))
}

/// Classifies already-decoded text as JSON, CSV, or unknown.
pub(crate) fn classify_text(text: &str) -> SourceFormat {
    match text.chars().find(|c| !c.is_whitespace()) {
        Some('{' | '[') => SourceFormat::Json,
        Some(_) => {
            if sniff_dialect(text).is_some() {
                SourceFormat::Csv
            } else {
                SourceFormat::Unknown
            }
        }
        None => SourceFormat::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::resolve_encoding;

    fn utf8() -> &'static Encoding {
        resolve_encoding(None).unwrap()
    }

    #[test]
    fn test_detect_spreadsheet_magic() {
        let result = detect_format(b"PK\x03\x04\x14\x00", utf8()).unwrap();
        assert_eq!(result, SourceFormat::Spreadsheet);
    }

    #[test]
    fn test_magic_beats_decoding() {
        // The rest of the buffer is not valid UTF-8, but the magic check
        // runs before any decode attempt.
        let result = detect_format(b"PK\xFF\xFE\xFD", utf8()).unwrap();
        assert_eq!(result, SourceFormat::Spreadsheet);
    }

    #[test]
    fn test_detect_json_object() {
        assert_eq!(
            detect_format(b"{\"key\": 1}", utf8()).unwrap(),
            SourceFormat::Json
        );
    }

    #[test]
    fn test_detect_json_array_with_leading_whitespace() {
        assert_eq!(
            detect_format(b"\n\t  [1, 2, 3]", utf8()).unwrap(),
            SourceFormat::Json
        );
    }

    #[test]
    fn test_detect_csv() {
        assert_eq!(
            detect_format(b"id,amount\n1,10\n2,20\n", utf8()).unwrap(),
            SourceFormat::Csv
        );
    }

    #[test]
    fn test_detect_semicolon_csv() {
        assert_eq!(
            detect_format(b"id;amount\n1;10\n", utf8()).unwrap(),
            SourceFormat::Csv
        );
    }

    #[test]
    fn test_detect_unknown_prose() {
        assert_eq!(
            detect_format(b"no delimiters here at all", utf8()).unwrap(),
            SourceFormat::Unknown
        );
    }

    #[test]
    fn test_detect_empty_buffer() {
        assert_eq!(detect_format(b"", utf8()).unwrap(), SourceFormat::Unknown);
    }

    #[test]
    fn test_detect_decode_error() {
        let result = detect_format(&[0xC3, 0x28, 0x2C, 0x61], utf8());
        assert!(matches!(result, Err(ConvertError::Decode { .. })));
    }
}
