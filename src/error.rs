//! Error types for loading, transforming and exporting tables
//!
//! - [`ConvertError::FileNotFound`] - input path does not exist
//! - [`ConvertError::Format`] - input exists but is not readable tabular data
//! - [`ConvertError::MissingColumn`] / [`ConvertError::KeyTypeMismatch`] - schema errors
//! - [`ConvertError::RecordNotFound`] - lookup key matched no record
//! - [`ConvertError::Io`] / [`ConvertError::Write`] / [`ConvertError::Json`] - output failures

use std::path::PathBuf;

use thiserror::Error;

use crate::model::CellType;

/// Errors raised by the conversion pipelines.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Input file does not exist.
    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// Input file could not be parsed as a table.
    #[error("Failed to parse {}: {message}", .path.display())]
    Format { path: PathBuf, message: String },

    /// A required column is absent from a table.
    #[error("Column '{column}' not found in table '{table}'")]
    MissingColumn { column: String, table: String },

    /// Join key columns hold values of incompatible types.
    #[error("Join key '{column}' has incompatible types: {left} (left) vs {right} (right)")]
    KeyTypeMismatch {
        column: String,
        left: CellType,
        right: CellType,
    },

    /// A lookup matched no record.
    #[error("No record with {column} = {value}")]
    RecordNotFound { column: String, value: String },

    /// Writing an output file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing to an output stream failed.
    #[error("Failed to write output: {0}")]
    Write(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    pub(crate) fn format(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        ConvertError::Format {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// True for errors caused by the shape of a table rather than by I/O.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            ConvertError::MissingColumn { .. } | ConvertError::KeyTypeMismatch { .. }
        )
    }
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_culprit() {
        let err = ConvertError::FileNotFound {
            path: PathBuf::from("登録基本部.xlsx"),
        };
        assert!(err.to_string().contains("登録基本部.xlsx"));

        let err = ConvertError::MissingColumn {
            column: "登録番号".into(),
            table: "basic".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("登録番号"));
        assert!(msg.contains("basic"));
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_format_helper() {
        let err = ConvertError::format("broken.xlsx", "no header row");
        assert!(!err.is_schema_error());
        assert_eq!(err.to_string(), "Failed to parse broken.xlsx: no header row");
    }

    #[test]
    fn test_record_not_found_names_key() {
        let err = ConvertError::RecordNotFound {
            column: "登録番号".into(),
            value: "99999".into(),
        };
        assert_eq!(err.to_string(), "No record with 登録番号 = 99999");
        assert!(!err.is_schema_error());
    }
}
