//! Typed rows and tables.

mod table;
mod value;

pub use table::{finite_values, paired_values, row, DataTable, Row};
pub use value::Value;
