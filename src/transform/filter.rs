//! Substring filter over one column

use tracing::warn;

use crate::model::Table;

/// Keep the rows whose `column` text contains `needle`, in order.
///
/// Nulls read as the empty string. A column the table lacks keeps nothing.
pub fn filter_contains(table: &Table, column: &str, needle: &str) -> Table {
    let mut result = Table::new(table.columns.clone()).with_name(table.name.clone());

    let Some(idx) = table.column_index(column) else {
        warn!(table = %table.name, column, "filter column not found, no rows kept");
        return result;
    };

    result.rows = table
        .rows
        .iter()
        .filter(|row| row.get(idx).is_some_and(|cell| cell.as_text().contains(needle)))
        .cloned()
        .collect();
    result
}
