//! Spreadsheet input for imports
//!
//! Source data and the column link, translation and merge tables are read from
//! delimited text files with a header row.

pub mod reader;

pub use reader::{read_records, read_table, SourceTable};
