//! CSV reader with dialect sniffing.
//!
//! CSV input carries no self-description, so the reader first infers a
//! [`Dialect`] (delimiter + quote convention) from a sample of the text,
//! then parses with the `csv` crate configured for that dialect. A file
//! whose delimiter cannot be established is not CSV as far as this crate
//! is concerned.

use csv::ReaderBuilder;
use serde_json::Value;

use dc_core::{Column, SourceFormat, Table};

use crate::error::ConvertError;
use crate::reader::parse_scalar;

/// Delimiters tried by the sniffer, in preference order.
const CANDIDATE_DELIMITERS: &[u8] = &[b',', b';', b'\t', b'|'];

/// Number of non-empty lines sampled when sniffing.
const SNIFF_WINDOW: usize = 16;

/// The inferred delimiter and quoting convention of a CSV file.
///
/// # Examples
///
/// ```
/// use dc_format::Dialect;
///
/// let dialect = Dialect::new(b';');
/// assert_eq!(dialect.delimiter, b';');
/// assert_eq!(dialect.quote, b'"');
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Quote character byte.
    pub quote: u8,
}

impl Dialect {
    /// Creates a dialect with the given delimiter and double-quote quoting.
    #[inline]
    #[must_use]
    pub const fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            quote: b'"',
        }
    }
}

/// Attempts to infer a CSV dialect from decoded text.
///
/// A candidate delimiter qualifies when it appears at least once on the
/// first sampled line and the same number of times (outside quotes) on
/// every sampled line. Candidates are tried in preference order, so a file
/// that is consistent under both `,` and `;` resolves to `,`.
///
/// Returns `None` when no candidate qualifies - including for empty text
/// and single-column files, which have nothing to sniff.
///
/// # Examples
///
/// ```
/// use dc_format::sniff_dialect;
///
/// assert_eq!(sniff_dialect("a,b\n1,2\n").map(|d| d.delimiter), Some(b','));
/// assert_eq!(sniff_dialect("a;b\n1;2\n").map(|d| d.delimiter), Some(b';'));
/// assert_eq!(sniff_dialect("no delimiters"), None);
/// ```
#[must_use]
pub fn sniff_dialect(text: &str) -> Option<Dialect> {
    let sample: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_WINDOW)
        .collect();

    let first = sample.first()?;

    for &delimiter in CANDIDATE_DELIMITERS {
        let expected = count_unquoted(first, delimiter);
        if expected == 0 {
            continue;
        }
        if sample
            .iter()
            .all(|line| count_unquoted(line, delimiter) == expected)
        {
            return Some(Dialect::new(delimiter));
        }
    }

    None
}

/// Counts delimiter occurrences outside double-quoted sections.
fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Parses decoded CSV text into a [`Table`] using the given dialect.
///
/// The first record is the header row; every following record must have
/// the same width. Cell values go through scalar inference, so numeric
/// columns come out as JSON numbers.
///
/// # Errors
///
/// Returns [`ConvertError::Structural`] when the `csv` crate reports a
/// parse error, including ragged rows.
///
/// # Examples
///
/// ```
/// use dc_format::{Dialect, read_csv_table};
///
/// let table = read_csv_table("id,amount\n1,10\n2,20\n", Dialect::new(b','))?;
/// assert_eq!(table.column_count(), 2);
/// assert_eq!(table.row_count(), 2);
/// # Ok::<(), dc_format::ConvertError>(())
/// ```
pub fn read_table(text: &str, dialect: Dialect) -> Result<Table, ConvertError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(dialect.delimiter)
        .quote(dialect.quote)
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ConvertError::structural(SourceFormat::Csv, e.to_string()))?
        .clone();

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record =
            record.map_err(|e| ConvertError::structural(SourceFormat::Csv, e.to_string()))?;
        for (index, field) in record.iter().enumerate() {
            columns[index].push(parse_scalar(field));
        }
    }

    Ok(headers
        .iter()
        .zip(columns)
        .map(|(name, values)| Column::new(name, values))
        .collect())
}
