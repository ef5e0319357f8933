//! Structured values produced by the format readers.
//!
//! The readers produce one of two shapes: an arbitrary JSON value (from the
//! JSON reader) or a [`Table`] of named columns (from the CSV and
//! spreadsheet readers). [`Payload`] is the tagged union over the two, and
//! the serializer chooses its rendering by tag rather than by inspecting
//! the value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

/// A single named column and its cell values.
///
/// # Examples
///
/// ```
/// use dc_core::Column;
/// use serde_json::json;
///
/// let column = Column::new("id", vec![json!(1), json!(2)]);
/// assert_eq!(column.name, "id");
/// assert_eq!(column.values.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// The column name, taken from the header row.
    pub name: String,

    /// One cell value per row, in row order.
    pub values: Vec<Value>,
}

impl Column {
    /// Creates a new column.
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// An ordered collection of equal-length columns.
///
/// This is the in-memory form of tabular input. Column order is the header
/// order of the source file and is preserved through serialization, which
/// renders the table as a column-oriented JSON object:
///
/// ```json
/// {"id": [1, 2], "amount": [10, 20]}
/// ```
///
/// # Memory Efficiency
///
/// Uses [`SmallVec`] with inline storage for up to 8 columns, avoiding heap
/// allocation for the typical narrow table.
///
/// # Examples
///
/// ```
/// use dc_core::{Column, Table};
/// use serde_json::json;
///
/// let table = Table::from_columns([
///     Column::new("id", vec![json!(1), json!(2)]),
///     Column::new("amount", vec![json!(10), json!(20)]),
/// ]);
///
/// assert_eq!(table.column_count(), 2);
/// assert_eq!(table.row_count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: SmallVec<[Column; 8]>,
}

impl Table {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table from an ordered sequence of columns.
    ///
    /// Callers are expected to supply columns of equal length; the readers
    /// guarantee this by construction.
    #[must_use]
    pub fn from_columns(columns: impl IntoIterator<Item = Column>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }

    /// Appends a column to the table.
    pub fn push_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Returns the number of columns.
    #[inline]
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the number of rows (the length of the first column, or 0).
    #[inline]
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// Returns `true` if the table has no columns.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns an iterator over the columns in header order.
    #[inline]
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Renders the table as a column-oriented JSON object.
    ///
    /// Each column becomes one key whose value is the array of that
    /// column's cells. Key order follows column order.
    ///
    /// # Examples
    ///
    /// ```
    /// use dc_core::{Column, Table};
    /// use serde_json::json;
    ///
    /// let table = Table::from_columns([
    ///     Column::new("name", vec![json!("a"), json!("b")]),
    /// ]);
    /// assert_eq!(table.to_value(), json!({"name": ["a", "b"]}));
    /// ```
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::with_capacity(self.columns.len());
        for column in &self.columns {
            map.insert(column.name.clone(), Value::Array(column.values.clone()));
        }
        Value::Object(map)
    }
}

impl FromIterator<Column> for Table {
    fn from_iter<T: IntoIterator<Item = Column>>(iter: T) -> Self {
        Self::from_columns(iter)
    }
}

/// The structured result of reading an input stream.
///
/// The serializer dispatches on the variant: mappings re-serialize as
/// compact JSON, tables render as pretty-printed column-oriented objects.
///
/// # Examples
///
/// ```
/// use dc_core::{Payload, Table};
/// use serde_json::json;
///
/// let mapping = Payload::Mapping(json!({"a": 1}));
/// assert!(mapping.is_mapping());
///
/// let table = Payload::Table(Table::new());
/// assert!(table.is_table());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// An arbitrary JSON value, as parsed by the JSON reader.
    Mapping(Value),
    /// A tabular value, as parsed by the CSV or spreadsheet reader.
    Table(Table),
}

impl Payload {
    /// Returns `true` for the [`Payload::Mapping`] variant.
    #[inline]
    #[must_use]
    pub const fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    /// Returns `true` for the [`Payload::Table`] variant.
    #[inline]
    #[must_use]
    pub const fn is_table(&self) -> bool {
        matches!(self, Self::Table(_))
    }
}

impl From<Value> for Payload {
    #[inline]
    fn from(value: Value) -> Self {
        Self::Mapping(value)
    }
}

impl From<Table> for Payload {
    #[inline]
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}
