//! Text decoding with named encodings.
//!
//! Input bytes are decoded with an `encoding_rs` encoding before any
//! text-based detection or parsing. The encoding is chosen once per
//! converter from a WHATWG label (`"utf-8"`, `"windows-1252"`, ...);
//! an absent label means UTF-8.

use encoding_rs::{Encoding, UTF_8};

use crate::error::ConvertError;

/// Resolves an optional encoding label to an `encoding_rs` encoding.
///
/// `None` resolves to UTF-8. Labels are matched per the WHATWG encoding
/// standard, so common aliases (`"latin1"`, `"utf8"`) work.
///
/// # Errors
///
/// Returns [`ConvertError::UnknownEncoding`] for an unrecognized label.
///
/// # Examples
///
/// ```
/// use dc_format::resolve_encoding;
///
/// assert_eq!(resolve_encoding(None)?.name(), "UTF-8");
/// assert_eq!(resolve_encoding(Some("latin1"))?.name(), "windows-1252");
/// assert!(resolve_encoding(Some("klingon")).is_err());
/// # Ok::<(), dc_format::ConvertError>(())
/// ```
pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding, ConvertError> {
    match label {
        None => Ok(UTF_8),
        Some(label) => Encoding::for_label(label.as_bytes())
            .ok_or_else(|| ConvertError::UnknownEncoding(label.to_owned())),
    }
}

/// Decodes a byte buffer into text with the given encoding.
///
/// A leading byte-order mark is honored and stripped. Any malformed byte
/// sequence fails the whole buffer - a file that does not decode cleanly is
/// treated as undecodable, not silently patched with replacement characters.
///
/// # Errors
///
/// Returns [`ConvertError::Decode`] if the buffer is not valid in the
/// given encoding.
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> Result<String, ConvertError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(ConvertError::Decode {
            encoding: encoding.name().to_owned(),
        });
    }
    Ok(text.into_owned())
}
