//! Format readers: pure functions from bytes/text to structured values.
//!
//! Each reader handles exactly one format and reports failure through
//! [`ConvertError`](crate::ConvertError); none of them touch the
//! filesystem. Shared scalar inference lives in this module so CSV and
//! spreadsheet cells agree on how `"1"`, `"2.5"`, and `""` become JSON.

pub(crate) mod csv;
pub(crate) mod json;
pub(crate) mod sheet;

use serde_json::Value;

/// Infers a JSON scalar from a raw text cell.
///
/// Tries, in order: empty → null, integer, float, boolean, and falls back
/// to the original string. Mirrors the column inference of the tabular
/// tooling this converter's output is consumed by, which is what makes
/// `1,10` come out as `[1, 10]` and not `["1", "10"]`.
pub(crate) fn parse_scalar(field: &str) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }

    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }

    if let Ok(float) = trimmed.parse::<f64>() {
        // NaN and infinity have no JSON representation; keep those as text.
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }

    match trimmed {
        "true" | "True" => return Value::Bool(true),
        "false" | "False" => return Value::Bool(false),
        _ => {}
    }

    Value::String(field.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_scalar_integer() {
        assert_eq!(parse_scalar("42"), json!(42));
        assert_eq!(parse_scalar("-7"), json!(-7));
    }

    #[test]
    fn test_parse_scalar_float() {
        assert_eq!(parse_scalar("2.5"), json!(2.5));
        assert_eq!(parse_scalar("1e3"), json!(1000.0));
    }

    #[test]
    fn test_parse_scalar_bool() {
        assert_eq!(parse_scalar("true"), json!(true));
        assert_eq!(parse_scalar("False"), json!(false));
    }

    #[test]
    fn test_parse_scalar_empty_is_null() {
        assert_eq!(parse_scalar(""), Value::Null);
        assert_eq!(parse_scalar("   "), Value::Null);
    }

    #[test]
    fn test_parse_scalar_string_fallback() {
        assert_eq!(parse_scalar("hello"), json!("hello"));
        // Non-finite floats parse but cannot be JSON numbers.
        assert_eq!(parse_scalar("NaN"), json!("NaN"));
    }

    #[test]
    fn test_parse_scalar_trims_for_numbers_only() {
        assert_eq!(parse_scalar(" 5 "), json!(5));
        // String fallback preserves the original field verbatim.
        assert_eq!(parse_scalar(" a b "), json!(" a b "));
    }
}
