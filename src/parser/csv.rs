//! CSV file parser

use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::config::Config;
use crate::error::{ConvertError, Result};
use crate::model::{CellValue, Table};

use super::{header_columns, Parser};

/// Parser for CSV files
pub struct CsvParser;

impl Parser for CsvParser {
    fn parse(&self, path: &Path, _config: &Config) -> Result<Table> {
        let file = File::open(path).map_err(|e| ConvertError::format(path, e))?;
        let reader = BufReader::new(file);
        let is_tsv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(if is_tsv { b'\t' } else { b',' })
            .from_reader(reader);

        // Read headers
        let headers = csv_reader
            .headers()
            .map_err(|e| ConvertError::format(path, format!("failed to read CSV headers: {}", e)))?
            .clone();
        if headers.is_empty() {
            return Err(ConvertError::format(path, "no header row found"));
        }

        let mut table = Table::new(header_columns(headers.iter().map(str::to_string)));

        for (line_num, result) in csv_reader.records().enumerate() {
            // +2 for 1-indexing and header
            let record = result.map_err(|e| {
                ConvertError::format(path, format!("row {}: {}", line_num + 2, e))
            })?;
            let cells: Vec<CellValue> = record.iter().map(parse_cell_value).collect();
            table.add_row(cells, line_num + 2);
        }

        Ok(table)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "csv" | "tsv" | "txt")
    }
}

/// Parse a string value into a CellValue with type inference
fn parse_cell_value(s: &str) -> CellValue {
    let trimmed = s.trim();

    // Check for empty/null
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || trimmed == "NA" {
        return CellValue::Null;
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }

    // "inf"/"nan" stay text
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return CellValue::Float(f);
        }
    }

    // Dates only when the text is already canonical, so export writes it back unchanged
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if date.format("%Y-%m-%d").to_string() == s {
            return CellValue::Date(date);
        }
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        if dt.format("%Y-%m-%dT%H:%M:%S").to_string() == s {
            return CellValue::DateTime(dt);
        }
    }

    // Text is kept verbatim
    CellValue::String(Cow::Owned(s.to_string()))
}
