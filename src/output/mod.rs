//! Output formatting for tables

mod json;

pub use json::{JsonOutput, Records};
