//! Table, Row, and Cell data structures

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::schema::{CellType, Column};
use crate::error::{ConvertError, Result};

/// A cell value with type information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Cow<'static, str>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Date(a), CellValue::Date(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            // Cross-type numeric comparison
            (CellValue::Int(a), CellValue::Float(b)) => (*a as f64) == *b,
            (CellValue::Float(a), CellValue::Int(b)) => *a == (*b as f64),
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Int and integral Float compare equal, so they must hash alike.
        match self {
            CellValue::Null => 0u8.hash(state),
            CellValue::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            CellValue::Int(i) => {
                2u8.hash(state);
                i.hash(state);
            }
            CellValue::Float(f) => match integral_value(*f) {
                Some(i) => {
                    2u8.hash(state);
                    i.hash(state);
                }
                None => {
                    3u8.hash(state);
                    if f.is_nan() {
                        u64::MAX.hash(state);
                    } else {
                        f.to_bits().hash(state);
                    }
                }
            },
            CellValue::String(s) => {
                4u8.hash(state);
                s.hash(state);
            }
            CellValue::Date(d) => {
                5u8.hash(state);
                d.hash(state);
            }
            CellValue::DateTime(dt) => {
                6u8.hash(state);
                dt.hash(state);
            }
        }
    }
}

/// The integer a float represents exactly, if any
pub(crate) fn integral_value(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl CellValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Convert to a display string
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed("NULL"),
            CellValue::Bool(b) => Cow::Owned(b.to_string()),
            CellValue::Int(i) => Cow::Owned(i.to_string()),
            CellValue::Float(f) => Cow::Owned(f.to_string()),
            CellValue::String(s) => Cow::Borrowed(s.as_ref()),
            CellValue::Date(d) => Cow::Owned(d.to_string()),
            CellValue::DateTime(dt) => Cow::Owned(dt.to_string()),
        }
    }

    /// Text used for substring matching; null renders as empty
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed(""),
            other => other.display(),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(Cow::Owned(s.to_string()))
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(Cow::Owned(s))
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

/// A row in the table
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Cell values in column order
    pub cells: Vec<CellValue>,
    /// Original line/row number in source file (1-indexed)
    pub source_line: usize,
}

impl Row {
    pub fn new(cells: Vec<CellValue>, source_line: usize) -> Self {
        Self { cells, source_line }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// A named table containing columns and rows
#[derive(Debug, Clone)]
pub struct Table {
    /// Where the table came from (file stem or derived name)
    pub name: String,
    /// Column definitions
    pub columns: Vec<Column>,
    /// All rows in the table
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a new empty table with column definitions
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            name: String::new(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Set the table name used in log lines and error messages
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Build a table from column names and rows of values
    pub fn from_rows<I, S>(names: I, rows: Vec<Vec<CellValue>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column::new(name, i))
            .collect();
        let mut table = Table::new(columns);
        for (i, cells) in rows.into_iter().enumerate() {
            table.add_row(cells, i + 1);
        }
        table.infer_column_types();
        table
    }

    /// Add a row, padding with nulls (or truncating) to the column count
    pub fn add_row(&mut self, mut cells: Vec<CellValue>, source_line: usize) {
        cells.resize(self.column_count(), CellValue::Null);
        self.rows.push(Row::new(cells, source_line));
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get column index by name, failing with a schema error
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| ConvertError::MissingColumn {
                column: name.to_string(),
                table: self.name.clone(),
            })
    }

    /// Column names in order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Look up a cell by row index and column name
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Infer column types from data
    pub fn infer_column_types(&mut self) {
        for (col_idx, col) in self.columns.iter_mut().enumerate() {
            col.inferred_type = self
                .rows
                .iter()
                .filter_map(|row| row.cells.get(col_idx))
                .fold(CellType::Null, |acc, cell| acc.widen(CellType::of(cell)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &CellValue) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_int_and_integral_float_are_one_key() {
        let a = CellValue::Int(1);
        let b = CellValue::Float(1.0);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(CellValue::Int(1), CellValue::Float(1.5));
        assert_ne!(CellValue::Int(1), CellValue::from("1"));
    }

    #[test]
    fn test_add_row_pads_short_rows() {
        let mut table = Table::new(vec![Column::new("a", 0), Column::new("b", 1)]);
        table.add_row(vec![CellValue::Int(1)], 2);
        assert_eq!(table.rows[0].cells, vec![CellValue::Int(1), CellValue::Null]);
        assert_eq!(table.rows[0].source_line, 2);
    }

    #[test]
    fn test_require_column() {
        let table = Table::from_rows(["登録番号"], vec![]).with_name("basic");
        assert_eq!(table.require_column("登録番号").ok(), Some(0));
        let err = table.require_column("作物名").unwrap_err();
        assert!(err.is_schema_error());
        assert!(err.to_string().contains("basic"));
    }

    #[test]
    fn test_infer_column_types() {
        let table = Table::from_rows(
            ["n", "mixed", "empty"],
            vec![
                vec![1i64.into(), 1i64.into(), CellValue::Null],
                vec![2.5f64.into(), "x".into(), CellValue::Null],
            ],
        );
        let types: Vec<CellType> = table.columns.iter().map(|c| c.inferred_type).collect();
        assert_eq!(types, vec![CellType::Float, CellType::Mixed, CellType::Null]);
    }

    #[test]
    fn test_as_text() {
        assert_eq!(CellValue::Null.as_text(), "");
        assert_eq!(CellValue::from("芝").as_text(), "芝");
        assert_eq!(CellValue::Int(7).as_text(), "7");
    }
}
