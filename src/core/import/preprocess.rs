//! Import preprocessing: column merges and value translations
//!
//! Both are table lookups driven by user-supplied files. Merges run first and
//! fuse several external columns into one Castor column; translations then
//! remap individual values.

use crate::adapters::spreadsheet::SourceTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Castor name reserved for the record id column in a column link
pub const RECORD_ID_COLUMN: &str = "record_id";

/// Maps an external column to a Castor variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLink {
    pub other: String,
    pub castor: String,
}

/// Replaces an external value of one column with a Castor value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRow {
    pub variable: String,
    pub other: String,
    pub castor: String,
}

/// Contributes `castor_value` to `castor_variable` wherever `other_variable`
/// holds `other_value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRow {
    pub other_variable: String,
    pub other_value: String,
    pub castor_variable: String,
    pub castor_value: String,
}

/// Adds one column per merge target and returns the target names
///
/// Each target cell holds the `;`-joined Castor values of every matching rule,
/// in rule order and without repeats. Target columns are named after the Castor
/// variable, so they link to it directly.
pub fn apply_merge(table: &mut SourceTable, merge: &[MergeRow]) -> Vec<String> {
    let mut targets: BTreeMap<&str, Vec<&MergeRow>> = BTreeMap::new();
    for rule in merge {
        targets.entry(rule.castor_variable.as_str()).or_default().push(rule);
    }

    let mut merged = Vec::new();
    for (target, rules) in targets {
        let values: Vec<String> = (0..table.len())
            .map(|row| {
                let mut hits: Vec<&str> = Vec::new();
                for rule in &rules {
                    let Some(column) = table.column_index(&rule.other_variable) else {
                        continue;
                    };
                    let cell = table.cell(row, column).trim();
                    if cell == rule.other_value && !hits.contains(&rule.castor_value.as_str()) {
                        hits.push(&rule.castor_value);
                    }
                }
                hits.join(";")
            })
            .collect();

        for rule in &rules {
            if table.column_index(&rule.other_variable).is_none() {
                tracing::warn!(
                    column = %rule.other_variable,
                    target = %target,
                    "Merge rule names a column absent from the source"
                );
            }
        }

        table.put_column(target, values);
        merged.push(target.to_string());
    }
    merged
}

/// Remaps values column by column; `;`-separated cells are remapped per entry
pub fn apply_translation(table: &mut SourceTable, translation: &[TranslationRow]) -> usize {
    let mut lookups: HashMap<&str, HashMap<&str, &str>> = HashMap::new();
    for row in translation {
        lookups
            .entry(row.variable.as_str())
            .or_default()
            .insert(row.other.as_str(), row.castor.as_str());
    }

    let mut translated = 0;
    for (variable, lookup) in lookups {
        let Some(column) = table.column_index(variable) else {
            tracing::warn!(column = %variable, "Translation names a column absent from the source");
            continue;
        };
        for row in 0..table.len() {
            let cell = table.cell(row, column);
            if cell.trim().is_empty() {
                continue;
            }
            let mut changed = false;
            let entries: Vec<&str> = cell
                .split(';')
                .map(|entry| match lookup.get(entry.trim()) {
                    Some(castor) => {
                        changed = true;
                        *castor
                    }
                    None => entry,
                })
                .collect();
            if changed {
                let value = entries.join(";");
                table.set_cell(row, column, value);
                translated += 1;
            }
        }
    }
    translated
}
