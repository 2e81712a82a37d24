//! In-memory table transforms: concatenation, left join, filtering

mod concat;
mod filter;
mod join;

pub use concat::concat_tables;
pub use filter::filter_contains;
pub use join::left_join;
