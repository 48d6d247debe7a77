//! Wide export tables
//!
//! A [`Table`] is an ordered list of typed columns and rows of [`Cell`]s. The
//! column kind records the cast applied to the column, such as the nullable
//! integer for years or the categorical domain for dropdowns.

use crate::domain::value::{format_number, ERROR_SENTINEL};

/// A single table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Number(f64),
    Integer(i64),
    Bool(bool),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// The rendered cell error
    pub fn error() -> Self {
        Cell::Text(ERROR_SENTINEL.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Cell::Text(text) if text == ERROR_SENTINEL)
    }

    /// Text written to a CSV file; null is the empty string
    pub fn render(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Text(text) => text.clone(),
            Cell::Number(number) => format_number(*number),
            Cell::Integer(integer) => integer.to_string(),
            Cell::Bool(true) => "True".to_string(),
            Cell::Bool(false) => "False".to_string(),
        }
    }
}

/// Cast applied to a column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    /// Record and instance attributes preceding the field columns
    Auxiliary,
    Text,
    Numeric,
    /// Whole numbers with nulls (year fields)
    NullableInt,
    /// Fixed category set: optiongroup labels then missing-data labels
    Categorical(Vec<String>),
    /// One checkbox option
    Flag,
    Date,
    DateTime,
    Time,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// One exported table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row; short rows are padded with nulls
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Cell at `row` in the named column
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|cells| cells.get(index))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of cells holding the error sentinel
    pub fn error_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .filter(|cell| cell.is_error())
            .count()
    }
}

/// All tables of one export
///
/// Survey and report tables are keyed by form name and kept in form order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedTables {
    pub study: Table,
    pub surveys: Vec<Table>,
    pub reports: Vec<Table>,
}

impl ExportedTables {
    pub fn survey(&self, name: &str) -> Option<&Table> {
        self.surveys.iter().find(|table| table.name == name)
    }

    pub fn report(&self, name: &str) -> Option<&Table> {
        self.reports.iter().find(|table| table.name == name)
    }

    /// Every table, study first
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        std::iter::once(&self.study)
            .chain(self.surveys.iter())
            .chain(self.reports.iter())
    }
}
