//! Spreadsheet reader for zip-container workbooks.
//!
//! Parses the first sheet of an xlsx workbook held in memory via
//! `calamine`. The first row supplies column names; remaining rows become
//! cell values. Only the first sheet is read - multi-sheet workbooks beyond
//! that are out of scope for the converter.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use serde_json::Value;

use dc_core::{Column, SourceFormat, Table};

use crate::error::ConvertError;

/// Parses spreadsheet container bytes into a [`Table`].
///
/// # Errors
///
/// Returns [`ConvertError::Structural`] when the container is corrupt, is
/// not actually an xlsx archive, or has no sheets.
pub fn read_table(bytes: &[u8]) -> Result<Table, ConvertError> {
    let cursor = Cursor::new(bytes);
    let mut workbook: Xlsx<Cursor<&[u8]>> = open_workbook_from_rs(cursor)
        .map_err(|e: calamine::XlsxError| {
            ConvertError::structural(SourceFormat::Spreadsheet, e.to_string())
        })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            ConvertError::structural(SourceFormat::Spreadsheet, "workbook contains no sheets")
        })?
        .map_err(|e| ConvertError::structural(SourceFormat::Spreadsheet, e.to_string()))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Table::new());
    };

    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(index, cell)| header_name(cell, index))
        .collect();

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (index, values) in columns.iter_mut().enumerate() {
            // Short rows pad with nulls so columns stay equal-length.
            values.push(row.get(index).map_or(Value::Null, cell_value));
        }
    }

    Ok(headers
        .into_iter()
        .zip(columns)
        .map(|(name, values)| Column::new(name, values))
        .collect())
}

/// Derives a column name from a header cell.
fn header_name(cell: &Data, index: usize) -> String {
    match cell {
        Data::String(s) if !s.is_empty() => s.clone(),
        Data::Empty => format!("column{index}"),
        other => {
            let text = other.to_string();
            if text.is_empty() {
                format!("column{index}")
            } else {
                text
            }
        }
    }
}

/// Converts a spreadsheet cell into a JSON value.
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => {
            // Whole floats come back as integers, matching how numeric
            // columns read from CSV serialize.
            if f.fract() == 0.0 && f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                Value::from(*f as i64)
            } else {
                serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number)
            }
        }
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::String(s.clone()),
        Data::DateTime(_) => Value::String(cell.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
    }
}
