//! Tabular export
//!
//! - [`frame`] - builds one wide table per form type from the study tree
//! - [`table`] - the table, column and cell model
//! - [`writer`] - CSV output
//! - [`summary`] - export summary and reporting

pub mod frame;
pub mod summary;
pub mod table;
pub mod writer;

pub use frame::export_tables;
pub use summary::{ExportError, ExportErrorType, ExportSummary, TableSummary};
pub use table::{Cell, Column, ColumnKind, ExportedTables, Table};
pub use writer::{sanitize_file_stem, write_table, write_tables};
