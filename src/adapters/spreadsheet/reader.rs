//! Delimited file reader

use crate::domain::{CastorError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// A table of external values, every cell a string
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Cell text; cells past the end of a short row are empty
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: String) {
        if let Some(cells) = self.rows.get_mut(row) {
            if cells.len() <= column {
                cells.resize(column + 1, String::new());
            }
            cells[column] = value;
        }
    }

    /// Adds a column, or replaces the one with the same name
    pub fn put_column(&mut self, name: &str, values: Vec<String>) {
        let index = match self.column_index(name) {
            Some(index) => index,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        };
        for (row, value) in values.into_iter().enumerate() {
            self.set_cell(row, index, value);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads a delimited file into a [`SourceTable`]
///
/// Headers lose a leading byte-order mark and surrounding whitespace; cells keep
/// their text as written.
///
/// # Errors
///
/// Fails if the file cannot be opened or a row cannot be parsed.
pub fn read_table(path: &Path, delimiter: u8) -> Result<SourceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|e| CastorError::Import(format!("read {}: {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| CastorError::Import(format!("read headers of {}: {e}", path.display())))?
        .iter()
        .map(|header| header.trim_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| CastorError::Import(format!("read record of {}: {e}", path.display())))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "Read source table");
    Ok(SourceTable::new(headers, rows))
}

/// Reads a delimited file into typed rows, matching columns by header name
///
/// # Errors
///
/// Fails if the file cannot be opened or a row does not fit `T`.
pub fn read_records<T: DeserializeOwned>(path: &Path, delimiter: u8) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| CastorError::Import(format!("read {}: {e}", path.display())))?;

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()
        .map_err(|e| CastorError::Import(format!("parse {}: {e}", path.display())))
}
