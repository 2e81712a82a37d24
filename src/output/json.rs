//! JSON record-array output
//!
//! One object per row, keys in column order. Text is written as UTF-8 and
//! never `\u`-escaped beyond what JSON requires.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use tracing::info;

use crate::config::DateFormat;
use crate::error::{ConvertError, Result};
use crate::model::{CellValue, Column, Row, Table};

/// JSON output formatter
#[derive(Debug, Clone, Copy)]
pub struct JsonOutput {
    pretty: bool,
    date_format: DateFormat,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self {
            pretty: true,
            date_format: DateFormat::default(),
        }
    }

    pub fn compact() -> Self {
        Self {
            pretty: false,
            ..Self::new()
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.date_format = format;
        self
    }

    /// Serializable view of a table's rows, for embedding in larger documents
    pub fn records<'a>(&self, table: &'a Table) -> Records<'a> {
        Records {
            table,
            date_format: self.date_format,
        }
    }

    /// Write the table as a JSON array followed by a newline
    pub fn render(&self, table: &Table, writer: &mut dyn Write) -> std::io::Result<()> {
        self.render_value(&self.records(table), writer)
    }

    /// Write any serializable value in this formatter's layout, plus a newline
    pub fn render_value<T: Serialize + ?Sized>(
        &self,
        value: &T,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, value)?;
        } else {
            serde_json::to_writer(&mut *writer, value)?;
        }
        writeln!(writer)?;

        Ok(())
    }

    /// Render to an in-memory string (no trailing newline)
    pub fn render_to_string(&self, table: &Table) -> Result<String> {
        let records = self.records(table);
        let text = if self.pretty {
            serde_json::to_string_pretty(&records)?
        } else {
            serde_json::to_string(&records)?
        };
        Ok(text)
    }

    /// Create or truncate `path` and write the table to it
    pub fn write_file(&self, table: &Table, path: &Path) -> Result<()> {
        let io_err = |source| ConvertError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        self.render(table, &mut writer).map_err(io_err)?;
        writer.flush().map_err(io_err)?;

        info!(path = %path.display(), rows = table.row_count(), "wrote JSON");
        Ok(())
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// Rows of a table serialized as an array of objects
pub struct Records<'a> {
    table: &'a Table,
    date_format: DateFormat,
}

struct Record<'a> {
    columns: &'a [Column],
    row: &'a Row,
    date_format: DateFormat,
}

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.table.row_count()))?;
        for row in &self.table.rows {
            seq.serialize_element(&Record {
                columns: &self.table.columns,
                row,
                date_format: self.date_format,
            })?;
        }
        seq.end()
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (col, cell) in self.columns.iter().zip(&self.row.cells) {
            map.serialize_entry(&col.name, &cell_value_to_json(cell, self.date_format))?;
        }
        map.end()
    }
}

fn cell_value_to_json(value: &CellValue, date_format: DateFormat) -> serde_json::Value {
    match value {
        CellValue::Null => serde_json::Value::Null,
        CellValue::Bool(b) => serde_json::Value::Bool(*b),
        CellValue::Int(i) => serde_json::json!(*i),
        // NaN and infinities become null
        CellValue::Float(f) => serde_json::json!(*f),
        CellValue::String(s) => serde_json::Value::String(s.to_string()),
        CellValue::Date(d) => match date_format {
            DateFormat::Iso => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            DateFormat::Epoch => d
                .and_hms_opt(0, 0, 0)
                .map(|dt| serde_json::json!(dt.and_utc().timestamp_millis()))
                .unwrap_or(serde_json::Value::Null),
        },
        CellValue::DateTime(dt) => match date_format {
            DateFormat::Iso => {
                serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
            DateFormat::Epoch => serde_json::json!(dt.and_utc().timestamp_millis()),
        },
    }
}
