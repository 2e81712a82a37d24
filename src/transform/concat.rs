//! Row-wise concatenation of tables

use indexmap::IndexSet;
use tracing::debug;

use crate::model::{CellValue, Column, Table};

/// Stack the rows of `tables` in order.
///
/// The result's columns are the union of all input columns in first-seen
/// order; rows from a table lacking a column get null for it.
pub fn concat_tables(tables: &[Table]) -> Table {
    let mut names: IndexSet<&str> = IndexSet::new();
    for table in tables {
        names.extend(table.column_names());
    }

    let mut columns: Vec<Column> = names
        .iter()
        .enumerate()
        .map(|(i, name)| Column::new(*name, i))
        .collect();
    for table in tables {
        for col in &table.columns {
            if let Some(idx) = names.get_index_of(col.name.as_str()) {
                columns[idx].inferred_type = columns[idx].inferred_type.widen(col.inferred_type);
            }
        }
    }

    let name = tables
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join("+");
    let mut result = Table::new(columns).with_name(name);

    for table in tables {
        // Position of each source column in the union
        let positions: Vec<usize> = table
            .column_names()
            .filter_map(|name| names.get_index_of(name))
            .collect();

        for row in &table.rows {
            let mut cells = vec![CellValue::Null; names.len()];
            for (cell, &pos) in row.cells.iter().zip(&positions) {
                cells[pos] = cell.clone();
            }
            result.add_row(cells, row.source_line);
        }
    }

    debug!(
        inputs = tables.len(),
        rows = result.row_count(),
        columns = result.column_count(),
        "concatenated tables"
    );
    result
}
