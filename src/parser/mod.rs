//! Parser layer for reading various tabular data formats

mod csv;
mod excel;
mod json;

use std::path::Path;

use indexmap::IndexSet;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ConvertError, Result};
use crate::model::{Column, Table};

pub use self::csv::CsvParser;
pub use self::excel::ExcelParser;
pub use self::json::JsonParser;

/// Trait for parsing tabular data files
pub trait Parser: Send + Sync {
    /// Parse a file and return a Table
    fn parse(&self, path: &Path, config: &Config) -> Result<Table>;

    /// Check if this parser can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Factory for creating parsers based on file extension
pub struct ParserFactory {
    parsers: Vec<Box<dyn Parser>>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    /// Create a new parser factory with all supported parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(ExcelParser),
                Box::new(CsvParser),
                Box::new(JsonParser),
            ],
        }
    }

    /// Get a parser for the given file path
    pub fn get_parser(&self, path: &Path) -> Result<&dyn Parser> {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_lowercase(),
            None => detect_format(path).unwrap_or("").to_string(),
        };

        self.parsers
            .iter()
            .find(|parser| parser.supports_extension(&ext))
            .map(|parser| parser.as_ref())
            .ok_or_else(|| {
                ConvertError::format(
                    path,
                    format!(
                        "unsupported file format: {}",
                        if ext.is_empty() { "unknown" } else { ext.as_str() }
                    ),
                )
            })
    }

    /// Parse a file using the appropriate parser
    pub fn parse(&self, path: &Path, config: &Config) -> Result<Table> {
        let parser = self.get_parser(path)?;
        parser.parse(path, config)
    }
}

/// Load one table from disk.
///
/// Fails with [`ConvertError::FileNotFound`] before any parser is tried when
/// the path does not exist.
pub fn load_table(path: &Path, config: &Config) -> Result<Table> {
    if !path.exists() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut table = ParserFactory::new().parse(path, config)?;
    table.name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    table.infer_column_types();

    info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "loaded table"
    );
    for col in &table.columns {
        debug!(table = %table.name, column = %col.name, kind = %col.inferred_type, "column");
    }

    Ok(table)
}

/// Turn raw header cells into unique column definitions.
///
/// Blank headers become `Unnamed: <index>`; repeated names get `.1`, `.2`, ...
pub(crate) fn header_columns<I>(raw: I) -> Vec<Column>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: IndexSet<String> = IndexSet::new();
    let mut columns = Vec::new();

    for (i, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name
        };

        let mut unique = base.clone();
        let mut n = 1;
        while seen.contains(&unique) {
            unique = format!("{}.{}", base, n);
            n += 1;
        }
        seen.insert(unique.clone());
        columns.push(Column::new(unique, i));
    }

    columns
}

/// Detect file format from content (for files without extension)
pub fn detect_format(path: &Path) -> Option<&'static str> {
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let mut buffer = [0u8; 8];
    let bytes_read = std::io::Read::read(&mut reader, &mut buffer).ok()?;

    if bytes_read < 4 {
        return None;
    }

    // Check for Excel ZIP format (xlsx)
    if &buffer[0..4] == b"PK\x03\x04" {
        return Some("xlsx");
    }

    // Check for old Excel format (xls)
    if &buffer[0..4] == b"\xD0\xCF\x11\xE0" {
        return Some("xls");
    }

    // Try to detect JSON
    reader.seek_relative(-(bytes_read as i64)).ok()?;
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let trimmed = line.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Some("json");
    }

    // Default to CSV
    Some("csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn names(columns: &[Column]) -> Vec<&str> {
        columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_header_columns_renames_blank_and_duplicates() {
        let columns = header_columns(
            ["登録番号", "", "name", "name", "name"]
                .into_iter()
                .map(String::from),
        );
        assert_eq!(
            names(&columns),
            vec!["登録番号", "Unnamed: 1", "name", "name.1", "name.2"]
        );
        assert_eq!(columns[3].index, 3);
    }

    #[test]
    fn test_missing_file_is_file_not_found() {
        let err = load_table(Path::new("does/not/exist.xlsx"), &Config::default()).unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }));
    }

    #[test]
    fn test_unknown_extension_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.parquet");
        std::fs::write(&path, b"PAR1....").unwrap();

        let err = load_table(&path, &Config::default()).unwrap_err();
        assert!(matches!(err, ConvertError::Format { .. }));
    }

    #[test]
    fn test_detect_format_without_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("records");
        let mut file = std::fs::File::create(&json_path).unwrap();
        writeln!(file, "[{{\"a\": 1}}]").unwrap();
        assert_eq!(detect_format(&json_path), Some("json"));

        let csv_path = dir.path().join("plain");
        std::fs::write(&csv_path, "a,b\n1,2\n").unwrap();
        assert_eq!(detect_format(&csv_path), Some("csv"));

        let table = load_table(&csv_path, &Config::default()).unwrap();
        assert_eq!(table.name, "plain");
        assert_eq!(table.row_count(), 1);
    }
}
