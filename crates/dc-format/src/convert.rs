//! The file converter: detection, reading, and serialization composed.

use std::fs;

use camino::Utf8Path;
use encoding_rs::Encoding;
use tracing::{debug, trace};

use dc_core::{ConvertConfig, Payload, SourceFormat};

use crate::decode::{decode_text, resolve_encoding};
use crate::detect::{SPREADSHEET_MAGIC, detect_format};
use crate::error::ConvertError;
use crate::reader::{csv, json, sheet};
use crate::serialize::to_json_text;

/// Converts a single source (file or in-memory byte stream) to JSON text.
///
/// The converter is cheap to construct and freely shareable across threads;
/// it holds only the resolved text encoding. It never writes output -
/// writing the mirrored tree is the walker's job - which keeps it reusable
/// for non-filesystem sources and unit-testable without touching disk.
///
/// # Fallback behavior
///
/// Detection is advisory. A stream that looks like JSON (leading `{`/`[`)
/// but fails the JSON reader is retried as CSV before the conversion is
/// declared failed, because upload directories routinely contain files
/// whose content and extension disagree.
///
/// # Examples
///
/// ```
/// use dc_format::FileConverter;
///
/// let converter = FileConverter::new(None)?;
///
/// // Tabular input becomes a column-oriented object.
/// let json = converter.convert_bytes(b"id,amount\n1,10\n2,20\n")?;
/// let value: serde_json::Value = serde_json::from_str(&json).unwrap();
/// assert_eq!(value["id"], serde_json::json!([1, 2]));
/// # Ok::<(), dc_format::ConvertError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FileConverter {
    /// Resolved text encoding for decoding input bytes.
    encoding: &'static Encoding,
}

impl FileConverter {
    /// Creates a converter with the given encoding label (`None` = UTF-8).
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::UnknownEncoding`] for an unrecognized label.
    /// Rejecting the label here, once, beats failing on every file later.
    pub fn new(encoding_label: Option<&str>) -> Result<Self, ConvertError> {
        Ok(Self {
            encoding: resolve_encoding(encoding_label)?,
        })
    }

    /// Creates a converter from a [`ConvertConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::UnknownEncoding`] if the configured label is
    /// not a known encoding.
    pub fn from_config(config: &ConvertConfig) -> Result<Self, ConvertError> {
        Self::new(config.encoding.as_deref())
    }

    /// Returns the name of the encoding this converter decodes with.
    #[must_use]
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Classifies a byte stream without converting it.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Decode`] if the stream cannot be decoded
    /// with this converter's encoding.
    pub fn detect(&self, bytes: &[u8]) -> Result<SourceFormat, ConvertError> {
        detect_format(bytes, self.encoding)
    }

    /// Converts a file on disk to JSON text.
    ///
    /// Reads the whole file, then behaves exactly like
    /// [`convert_bytes`](Self::convert_bytes). Does not write anything.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::NotFound`] if the path no longer exists,
    /// [`ConvertError::Io`] for other read failures, and the
    /// [`convert_bytes`](Self::convert_bytes) errors otherwise.
    pub fn convert_path(&self, path: &Utf8Path) -> Result<String, ConvertError> {
        debug!(path = %path, "Converting file");

        let bytes = fs::read(path.as_std_path()).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConvertError::not_found(path)
            } else {
                ConvertError::Io(e)
            }
        })?;

        self.convert_bytes(&bytes)
    }

    /// Converts an in-memory byte stream to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Decode`] for undecodable bytes,
    /// [`ConvertError::Structural`] when a matched reader fails, and
    /// [`ConvertError::Unrecognized`] when no reader applies.
    pub fn convert_bytes(&self, bytes: &[u8]) -> Result<String, ConvertError> {
        let payload = self.read_payload(bytes)?;
        to_json_text(&payload)
    }

    /// Parses a byte stream into its structured payload.
    ///
    /// This is the detection + reader half of a conversion, exposed for
    /// callers that want the structured value instead of JSON text.
    ///
    /// # Errors
    ///
    /// Same as [`convert_bytes`](Self::convert_bytes).
    pub fn read_payload(&self, bytes: &[u8]) -> Result<Payload, ConvertError> {
        if bytes.starts_with(SPREADSHEET_MAGIC) {
            trace!("Stream matches spreadsheet magic");
            return sheet::read_table(bytes).map(Payload::Table);
        }

        let text = decode_text(bytes, self.encoding)?;

        match text.chars().find(|c| !c.is_whitespace()) {
            Some('{' | '[') => match json::read_value(&text) {
                Ok(value) => Ok(Payload::Mapping(value)),
                Err(json_error) => {
                    debug!(error = %json_error, "JSON reader failed, retrying as CSV");
                    match csv::sniff_dialect(&text) {
                        Some(dialect) => csv::read_table(&text, dialect).map(Payload::Table),
                        None => Err(ConvertError::Unrecognized),
                    }
                }
            },
            _ => match csv::sniff_dialect(&text) {
                Some(dialect) => csv::read_table(&text, dialect).map(Payload::Table),
                None => Err(ConvertError::Unrecognized),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn converter() -> FileConverter {
        FileConverter::new(None).unwrap()
    }

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_unknown_encoding_rejected_up_front() {
        assert!(matches!(
            FileConverter::new(Some("martian")),
            Err(ConvertError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_json_round_trip_equivalence() {
        let input = br#"{"name": "report", "rows": [1, 2, 3]}"#;
        let output = converter().convert_bytes(input).unwrap();
        assert_eq!(
            parse(&output),
            serde_json::from_slice::<Value>(input).unwrap()
        );
    }

    #[test]
    fn test_json_array_input() {
        let output = converter().convert_bytes(b"[1, 2, 3]").unwrap();
        assert_eq!(parse(&output), json!([1, 2, 3]));
    }

    #[test]
    fn test_csv_column_oriented_output() {
        let output = converter()
            .convert_bytes(b"id,amount\n1,10\n2,20\n")
            .unwrap();
        assert_eq!(parse(&output), json!({"id": [1, 2], "amount": [10, 20]}));
    }

    #[test]
    fn test_csv_array_lengths_equal_row_count() {
        let output = converter()
            .convert_bytes(b"a,b,c\n1,2,3\n4,5,6\n7,8,9\n")
            .unwrap();
        let value = parse(&output);
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        for column in object.values() {
            assert_eq!(column.as_array().unwrap().len(), 3);
        }
    }

    #[test]
    fn test_idempotent_output() {
        let input = b"id,amount\n1,10\n2,20\n";
        let first = converter().convert_bytes(input).unwrap();
        let second = converter().convert_bytes(input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_json_falls_back_to_csv() {
        // Starts with '{' but is not JSON; it is a CSV whose first header
        // happens to open with a brace.
        let input = b"{code},value\n{a},1\n{b},2\n";
        let output = converter().convert_bytes(input).unwrap();
        assert_eq!(
            parse(&output),
            json!({"{code}": ["{a}", "{b}"], "value": [1, 2]})
        );
    }

    #[test]
    fn test_json_fallback_exhausted() {
        // Looks like JSON, is not JSON, and has no sniffable dialect.
        let result = converter().convert_bytes(b"{ not json and not csv");
        assert!(matches!(result, Err(ConvertError::Unrecognized)));
    }

    #[test]
    fn test_spreadsheet_magic_with_corrupt_body() {
        let result = converter().convert_bytes(b"PK\x03\x04 garbage body");
        assert!(matches!(
            result,
            Err(ConvertError::Structural {
                format: SourceFormat::Spreadsheet,
                ..
            })
        ));
    }

    #[test]
    fn test_undecodable_input() {
        let result = converter().convert_bytes(&[0x41, 0xC0, 0x80]);
        assert!(matches!(result, Err(ConvertError::Decode { .. })));
    }

    #[test]
    fn test_prose_is_unrecognized() {
        let result = converter().convert_bytes(b"hello world without structure");
        assert!(matches!(result, Err(ConvertError::Unrecognized)));
    }

    #[test]
    fn test_empty_input_is_unrecognized() {
        assert!(matches!(
            converter().convert_bytes(b""),
            Err(ConvertError::Unrecognized)
        ));
    }

    #[test]
    fn test_missing_path() {
        let result = converter().convert_path(Utf8Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(ConvertError::NotFound(_))));
    }

    #[test]
    fn test_latin1_csv() {
        let converter = FileConverter::new(Some("windows-1252")).unwrap();
        // "café" with 0xE9 for é, invalid as UTF-8.
        let input = b"name\ncaf\xE9\n";
        // Single column: no dialect to sniff, so this is unrecognized -
        // but it must fail *after* decoding succeeds, not with Decode.
        assert!(matches!(
            converter.convert_bytes(input),
            Err(ConvertError::Unrecognized)
        ));

        let two_column = b"name,origin\ncaf\xE9,fr\n";
        let output = converter.convert_bytes(two_column).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&output).unwrap(),
            json!({"name": ["café"], "origin": ["fr"]})
        );
    }
}
