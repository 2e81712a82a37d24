//! sheet2json - Spreadsheet to JSON conversion
//!
//! Reads Excel, CSV and JSON tables, optionally stacks and left-joins them on
//! a key column, and writes JSON record arrays. The joined records can then be
//! searched by keyword or looked up by registration number.

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod search;
pub mod transform;

pub use config::Config;
pub use error::ConvertError;
pub use model::Table;
