//! JSON reader.

use serde_json::Value;

use dc_core::SourceFormat;

use crate::error::ConvertError;

/// Parses decoded text as a JSON value.
///
/// Accepts any top-level JSON value; the detector only routes `{`/`[`
/// prefixed streams here, but the reader itself does not re-check that.
///
/// # Errors
///
/// Returns [`ConvertError::Structural`] on malformed JSON.
///
/// # Examples
///
/// ```
/// use dc_format::read_json_value;
/// use serde_json::json;
///
/// let value = read_json_value(r#"{"a": [1, 2]}"#)?;
/// assert_eq!(value, json!({"a": [1, 2]}));
/// # Ok::<(), dc_format::ConvertError>(())
/// ```
pub fn read_value(text: &str) -> Result<Value, ConvertError> {
    serde_json::from_str(text)
        .map_err(|e| ConvertError::structural(SourceFormat::Json, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_object() {
        let value = read_value(r#"{"id": 1, "name": "a"}"#).unwrap();
        assert_eq!(value, json!({"id": 1, "name": "a"}));
    }

    #[test]
    fn test_read_array() {
        let value = read_value("[1, 2, 3]").unwrap();
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn test_read_nested() {
        let value = read_value(r#"{"rows": [{"x": 1}, {"x": 2}]}"#).unwrap();
        assert_eq!(value["rows"][1]["x"], json!(2));
    }

    #[test]
    fn test_read_malformed() {
        let result = read_value("{\"unterminated\": ");
        assert!(matches!(
            result,
            Err(ConvertError::Structural {
                format: SourceFormat::Json,
                ..
            })
        ));
    }

    #[test]
    fn test_read_trailing_garbage() {
        assert!(read_value("{} trailing").is_err());
    }
}
