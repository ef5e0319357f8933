//! Rendering payloads back to JSON text.
//!
//! The output contract, chosen for compatibility with the consumers of the
//! converted tree:
//!
//! - Tables render as a pretty-printed column-oriented object
//!   (`{"col": [v1, v2, ...]}`).
//! - Mappings re-serialize compactly. Re-serialization (rather than
//!   passing the input bytes through) guarantees consistent formatting
//!   regardless of how the source file was laid out.

use dc_core::Payload;

use crate::error::ConvertError;

/// Renders a payload as canonical JSON text.
///
/// # Errors
///
/// Serialization of an in-memory JSON value does not fail in practice; an
/// error here is surfaced as [`ConvertError::Io`].
///
/// # Examples
///
/// ```
/// use dc_core::{Column, Payload, Table};
/// use dc_format::to_json_text;
/// use serde_json::json;
///
/// let table = Table::from_columns([Column::new("id", vec![json!(1)])]);
/// let text = to_json_text(&Payload::Table(table))?;
/// assert_eq!(text, "{\n  \"id\": [\n    1\n  ]\n}");
/// # Ok::<(), dc_format::ConvertError>(())
/// ```
pub fn to_json_text(payload: &Payload) -> Result<String, ConvertError> {
    let rendered = match payload {
        Payload::Mapping(value) => serde_json::to_string(value),
        Payload::Table(table) => serde_json::to_string_pretty(&table.to_value()),
    };
    rendered.map_err(|e| ConvertError::Io(std::io::Error::other(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_core::{Column, Table};
    use serde_json::json;

    #[test]
    fn test_mapping_is_compact() {
        let payload = Payload::Mapping(json!({"a": 1, "b": [2, 3]}));
        let text = to_json_text(&payload).unwrap();
        assert!(!text.contains('\n'));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&text).unwrap(),
            json!({"a": 1, "b": [2, 3]})
        );
    }

    #[test]
    fn test_table_is_pretty() {
        let table = Table::from_columns([
            Column::new("id", vec![json!(1), json!(2)]),
            Column::new("amount", vec![json!(10), json!(20)]),
        ]);
        let text = to_json_text(&Payload::Table(table)).unwrap();
        assert!(text.contains('\n'));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&text).unwrap(),
            json!({"id": [1, 2], "amount": [10, 20]})
        );
    }

    #[test]
    fn test_mapping_canonicalizes_formatting() {
        // Whatever whitespace the source had, output formatting is ours.
        let source: serde_json::Value = serde_json::from_str("{ \"x\" :\n 1 }").unwrap();
        let text = to_json_text(&Payload::Mapping(source)).unwrap();
        assert_eq!(text, r#"{"x":1}"#);
    }

    #[test]
    fn test_deterministic_output() {
        let table = Table::from_columns([Column::new("k", vec![json!("v")])]);
        let payload = Payload::Table(table);
        assert_eq!(
            to_json_text(&payload).unwrap(),
            to_json_text(&payload).unwrap()
        );
    }
}
