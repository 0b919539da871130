//! Tabular input: loading and grouping.
//!
//! The loader turns spreadsheets and CSV files into rows with a named-field
//! schema; the grouper partitions them by the key column.

mod grouper;
mod loader;

pub use grouper::{Group, group_rows};
pub use loader::{Row, Table, load_table};
