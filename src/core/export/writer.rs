//! CSV output of exported tables

use super::table::{ExportedTables, Table};
use crate::domain::{CastorError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes every table to `dir`, one CSV file each
///
/// Files are named `study.csv`, `survey_<name>.csv` and `report_<name>.csv`.
/// Names that sanitize to the same stem get a numeric suffix (`_2`, `_3`, ...).
/// Returns the written paths in table order.
///
/// # Errors
///
/// Fails if the directory cannot be created or a file cannot be written.
pub fn write_tables(tables: &ExportedTables, dir: &Path, delimiter: u8) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| {
        CastorError::Export(format!(
            "Failed to create output directory {}: {e}",
            dir.display()
        ))
    })?;

    let mut written = Vec::new();
    let mut used = HashSet::new();

    let path = dir.join(unique_file_name("study", &mut used));
    write_table(&tables.study, &path, delimiter)?;
    written.push(path);

    for (prefix, group) in [("survey", &tables.surveys), ("report", &tables.reports)] {
        for table in group {
            let stem = format!("{prefix}_{}", sanitize_file_stem(&table.name));
            let path = dir.join(unique_file_name(&stem, &mut used));
            write_table(table, &path, delimiter)?;
            written.push(path);
        }
    }

    Ok(written)
}

fn unique_file_name(stem: &str, used: &mut HashSet<String>) -> String {
    let mut name = format!("{stem}.csv");
    let mut suffix = 2;
    while !used.insert(name.clone()) {
        tracing::warn!(stem, suffix, "Table file name collides, adding a suffix");
        name = format!("{stem}_{suffix}.csv");
        suffix += 1;
    }
    name
}

/// Writes one table with a header row
pub fn write_table(table: &Table, path: &Path, delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;

    writer.write_record(table.column_names())?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.render()))?;
    }
    writer.flush()?;

    tracing::debug!(
        table = %table.name,
        path = %path.display(),
        rows = table.len(),
        columns = table.columns.len(),
        "Table written"
    );
    Ok(())
}

/// Lowercase file stem with runs of non-alphanumerics collapsed to `_`
pub fn sanitize_file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "unnamed".to_string()
    } else {
        stem.to_string()
    }
}
