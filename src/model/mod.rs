//! Data model for tabular data representation

mod schema;
mod table;

pub use schema::{CellType, Column};
pub(crate) use table::integral_value;
pub use table::{CellValue, Row, Table};
