//! JSON record array parser

use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexSet;
use serde_json::Value;

use crate::config::Config;
use crate::error::{ConvertError, Result};
use crate::model::{CellValue, Column, Table};

use super::Parser;

/// Parser for JSON array files
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse(&self, path: &Path, _config: &Config) -> Result<Table> {
        let file = File::open(path).map_err(|e| ConvertError::format(path, e))?;
        let reader = BufReader::new(file);

        let value: Value =
            serde_json::from_reader(reader).map_err(|e| ConvertError::format(path, e))?;
        records_to_table(value).map_err(|message| ConvertError::format(path, message))
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "json")
    }
}

fn records_to_table(value: Value) -> std::result::Result<Table, &'static str> {
    // Handle both arrays and single objects
    let array = match value {
        Value::Array(arr) => arr,
        Value::Object(_) => vec![value],
        _ => return Err("JSON must be an array or object"),
    };

    // Collect all unique keys across all objects to build column list
    let mut column_names: IndexSet<String> = IndexSet::new();
    for item in &array {
        match item {
            Value::Object(obj) => column_names.extend(obj.keys().cloned()),
            _ => return Err("JSON array items must be objects"),
        }
    }

    let columns: Vec<Column> = column_names
        .iter()
        .enumerate()
        .map(|(i, name)| Column::new(name.clone(), i))
        .collect();
    let mut table = Table::new(columns);

    for (line_num, item) in array.iter().enumerate() {
        if let Value::Object(obj) = item {
            let cells = column_names
                .iter()
                .map(|key| json_value_to_cell(obj.get(key)))
                .collect();
            table.add_row(cells, line_num + 1);
        }
    }

    Ok(table)
}

fn json_value_to_cell(value: Option<&Value>) -> CellValue {
    match value {
        None | Some(Value::Null) => CellValue::Null,
        Some(Value::Bool(b)) => CellValue::Bool(*b),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                CellValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(Cow::Owned(n.to_string()))
            }
        }
        // Text passes through untouched, even when it looks like a date
        Some(Value::String(s)) => CellValue::String(Cow::Owned(s.clone())),
        // Nested values are kept as their JSON text
        Some(nested @ (Value::Array(_) | Value::Object(_))) => {
            CellValue::String(Cow::Owned(nested.to_string()))
        }
    }
}
