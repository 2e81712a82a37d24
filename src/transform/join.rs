//! Left hash join on a single key column

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::model::{CellValue, Column, Table};

/// Where a right-table column lands in the joined row
enum Slot {
    Key,
    Existing(usize),
    Appended(usize),
}

/// Left-join `right` onto `left` using the column `key` present in both.
///
/// Every left row appears at least once, in order. A left row with several
/// matches is repeated once per match, in right-table order. Null keys never
/// match. On a name collision the matched right value wins; unmatched rows
/// keep their left value and get null for right-only columns.
pub fn left_join(left: &Table, right: &Table, key: &str) -> Result<Table> {
    let left_key = left.require_column(key)?;
    let right_key = right.require_column(key)?;

    let left_type = left.columns[left_key].inferred_type;
    let right_type = right.columns[right_key].inferred_type;
    if !left_type.is_join_compatible(right_type) {
        return Err(ConvertError::KeyTypeMismatch {
            column: key.to_string(),
            left: left_type,
            right: right_type,
        });
    }

    // Output schema: left columns, then right-only columns
    let mut columns: Vec<Column> = left.columns.clone();
    let mut slots = Vec::with_capacity(right.column_count());
    for (i, col) in right.columns.iter().enumerate() {
        if i == right_key {
            slots.push(Slot::Key);
        } else if let Some(idx) = left.column_index(&col.name) {
            columns[idx].inferred_type = columns[idx].inferred_type.widen(col.inferred_type);
            slots.push(Slot::Existing(idx));
        } else {
            let idx = columns.len();
            columns.push(Column::with_type(col.name.clone(), idx, col.inferred_type));
            slots.push(Slot::Appended(idx));
        }
    }
    let width = columns.len();

    // Build side: right rows by key value
    let mut index: FxHashMap<&CellValue, Vec<usize>> = FxHashMap::default();
    for (i, row) in right.rows.iter().enumerate() {
        match row.get(right_key) {
            Some(value) if !value.is_null() => index.entry(value).or_default().push(i),
            _ => {}
        }
    }

    let mut result = Table::new(columns).with_name(left.name.clone());
    let mut unmatched = 0usize;

    for row in &left.rows {
        let matches = row
            .get(left_key)
            .filter(|value| !value.is_null())
            .and_then(|value| index.get(value));

        let mut base = row.cells.clone();
        base.resize(width, CellValue::Null);

        match matches {
            Some(right_rows) => {
                for &ri in right_rows {
                    let mut cells = base.clone();
                    for (slot, cell) in slots.iter().zip(&right.rows[ri].cells) {
                        match slot {
                            Slot::Key => {}
                            Slot::Existing(idx) | Slot::Appended(idx) => cells[*idx] = cell.clone(),
                        }
                    }
                    result.add_row(cells, row.source_line);
                }
            }
            None => {
                unmatched += 1;
                result.add_row(base, row.source_line);
            }
        }
    }

    debug!(
        key,
        left_rows = left.row_count(),
        right_rows = right.row_count(),
        rows = result.row_count(),
        unmatched,
        "left join"
    );
    Ok(result)
}
