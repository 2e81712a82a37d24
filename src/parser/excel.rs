//! Excel file parser (xlsx, xls, ods)

use std::borrow::Cow;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveTime;
use tracing::debug;

use crate::config::Config;
use crate::error::{ConvertError, Result};
use crate::model::{integral_value, CellValue, Table};

use super::{header_columns, Parser};

/// Parser for Excel files
pub struct ExcelParser;

impl Parser for ExcelParser {
    fn parse(&self, path: &Path, config: &Config) -> Result<Table> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| ConvertError::format(path, e))?;

        // Get sheet name
        let sheet_name = if let Some(ref name) = config.sheet_name {
            name.clone()
        } else {
            // Use first sheet
            workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| ConvertError::format(path, "no sheets found in workbook"))?
        };
        debug!(path = %path.display(), sheet = %sheet_name, "reading sheet");

        let range: Range<Data> = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ConvertError::format(path, format!("sheet '{}': {}", sheet_name, e)))?;

        parse_range(range, path)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "xlsx" | "xls" | "ods" | "xlsm" | "xlsb")
    }
}

/// Build a table from a sheet range whose first row is the header
fn parse_range(range: Range<Data>, path: &Path) -> Result<Table> {
    let header_row = range
        .rows()
        .next()
        .ok_or_else(|| ConvertError::format(path, "no header row found"))?;
    let columns = header_columns(header_row.iter().map(cell_to_string));

    // Sheet row of the header, 1-indexed
    let header_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

    let mut table = Table::new(columns);
    for (i, row) in range.rows().skip(1).enumerate() {
        // Blank sheet rows are not records
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
        table.add_row(cells, header_line + i + 1);
    }

    Ok(table)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => match integral_value(*f) {
            Some(i) => i.to_string(),
            None => f.to_string(),
        },
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => datetime.to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::String(Cow::Owned(s.clone())),
        // Excel stores every number as a float
        Data::Float(f) => match integral_value(*f) {
            Some(i) => CellValue::Int(i),
            None => CellValue::Float(*f),
        },
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Float(dt.as_f64()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) if Some(datetime.time()) == NaiveTime::from_hms_opt(0, 0, 0) => {
                CellValue::Date(datetime.date())
            }
            Some(datetime) => CellValue::DateTime(datetime),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => {
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                CellValue::DateTime(dt)
            } else if let Ok(d) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                CellValue::Date(d)
            } else {
                CellValue::String(Cow::Owned(s.clone()))
            }
        }
        Data::DurationIso(s) => CellValue::String(Cow::Owned(s.clone())),
        Data::Error(e) => CellValue::String(Cow::Owned(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;
    use chrono::NaiveDate;

    fn sheet(cells: &[&[Data]]) -> Range<Data> {
        let height = cells.len() as u32;
        let width = cells.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    #[test]
    fn test_parse_range_reads_header_and_rows() {
        let range = sheet(&[
            &[text("登録番号"), text("農薬の名称")],
            &[Data::Float(1.0), text("ジマンダイセン水和剤")],
            &[Data::Float(2.0), Data::Empty],
            &[Data::Float(3.5), text("芝用")],
        ]);
        let table = parse_range(range, Path::new("basic.xlsx")).unwrap();

        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["登録番号", "農薬の名称"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows[0].cells[0], CellValue::Int(1));
        assert!(matches!(table.rows[0].cells[0], CellValue::Int(_)));
        assert_eq!(table.rows[1].cells[1], CellValue::Null);
        assert_eq!(table.rows[2].cells[0], CellValue::Float(3.5));
        assert_eq!(table.rows[0].source_line, 2);
    }

    #[test]
    fn test_header_only_sheet_is_empty_table() {
        let range = sheet(&[&[text("a"), text("b")]]);
        let table = parse_range(range, Path::new("t.xlsx")).unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_empty_sheet_is_format_error() {
        let range: Range<Data> = Range::empty();
        let err = parse_range(range, Path::new("t.xlsx")).unwrap_err();
        assert!(matches!(err, ConvertError::Format { .. }));
    }

    #[test]
    fn test_convert_cell_types() {
        assert_eq!(convert_cell(&Data::Bool(true)), CellValue::Bool(true));
        assert_eq!(convert_cell(&text("  ")), CellValue::from("  "));
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2024-04-01".to_string())),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap())
        );
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2024-04-01T09:30:00".to_string())),
            CellValue::DateTime(
                NaiveDate::from_ymd_opt(2024, 4, 1)
                    .unwrap()
                    .and_hms_opt(9, 30, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let range = sheet(&[
            &[text("登録番号"), text("作物名")],
            &[Data::Float(1.0), Data::Empty],
            &[Data::Empty, Data::Empty],
            &[Data::Float(2.0), Data::Empty],
        ]);
        let table = parse_range(range, Path::new("app.xlsx")).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1].cells, vec![CellValue::Int(2), CellValue::Null]);
        assert_eq!(table.rows[1].source_line, 4);
    }

    #[test]
    fn test_error_cells_use_excel_notation() {
        assert_eq!(
            convert_cell(&Data::Error(CellErrorType::Div0)),
            CellValue::from("#DIV/0!")
        );
        assert_eq!(convert_cell(&Data::Error(CellErrorType::NA)), CellValue::from("#N/A"));
        assert_eq!(cell_to_string(&Data::Error(CellErrorType::Ref)), "#REF!");
    }

    #[test]
    fn test_numeric_header_is_stringified() {
        assert_eq!(cell_to_string(&Data::Float(2024.0)), "2024");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
