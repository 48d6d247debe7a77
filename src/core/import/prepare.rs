//! Whole-table castorization with the all-or-nothing gate
//!
//! A source table is merged, translated, and castorized column by column. If
//! any cell ends up as an error, the batch is rejected with every failing cell
//! listed and nothing is uploaded.

use super::castorize::{
    castorize_dependent, castorize_value, ensure_castorizable, Castorized, CastorizeOptions,
};
use super::preprocess::{
    apply_merge, apply_translation, ColumnLink, MergeRow, TranslationRow, RECORD_ID_COLUMN,
};
use crate::adapters::castor::FieldValuePost;
use crate::adapters::spreadsheet::SourceTable;
use crate::domain::{CastorError, CellErrorReport, Field, RecordId, Result, Study};
use std::collections::HashMap;

/// A Castor field receiving a source column
#[derive(Debug, Clone, PartialEq)]
pub struct CastorizedColumn {
    pub field_id: String,
    pub field_name: String,
    pub form_id: String,
    /// Source column the values came from
    pub source_column: String,
}

/// One source row, castorized
#[derive(Debug, Clone, PartialEq)]
pub struct CastorizedRow {
    /// Zero-based index in the source table
    pub row: usize,
    pub record_id: String,
    /// One cell per [`CastorizedTable::columns`] entry
    pub values: Vec<Castorized>,
}

/// Platform-ready rows that passed the gate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CastorizedTable {
    pub columns: Vec<CastorizedColumn>,
    pub rows: Vec<CastorizedRow>,
}

impl CastorizedTable {
    /// Upload payload for one row; empty cells are left out
    pub fn field_values(&self, row: &CastorizedRow) -> Vec<FieldValuePost> {
        self.columns
            .iter()
            .zip(&row.values)
            .filter_map(|(column, value)| {
                value.as_wire().map(|wire| FieldValuePost {
                    field_id: column.field_id.clone(),
                    field_value: wire.to_string(),
                })
            })
            .collect()
    }

    pub fn column(&self, field_name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.field_name == field_name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

struct LinkedColumn<'a> {
    field: &'a Field,
    source: usize,
    source_name: &'a str,
    /// Parent field id and trigger code, when the parent is linked as well
    dependency: Option<(&'a str, &'a str)>,
    /// Code substituted for unrecognized entries, when a dependent is linked
    fallback: Option<&'a str>,
}

/// Castorizes `source` for upload into `study`
///
/// Merges run before translations. Merged columns link to the Castor variable
/// they are named after.
///
/// # Errors
///
/// - [`CastorError::Import`] if the link table has no `record_id` entry, names
///   an absent source column or names an unknown Castor variable
/// - [`CastorError::UnsupportedFieldType`] if a linked field cannot be castorized
/// - [`CastorError::NonViableData`] if any cell failed, listing every such cell
pub fn castorize_upload(
    study: &Study,
    mut source: SourceTable,
    links: &[ColumnLink],
    translation: Option<&[TranslationRow]>,
    merge: Option<&[MergeRow]>,
    options: &CastorizeOptions,
) -> Result<CastorizedTable> {
    let mut links = links.to_vec();
    if let Some(merge) = merge {
        for target in apply_merge(&mut source, merge) {
            if !links.iter().any(|link| link.castor == target) {
                links.push(ColumnLink {
                    other: target.clone(),
                    castor: target,
                });
            }
        }
    }
    if let Some(translation) = translation {
        let translated = apply_translation(&mut source, translation);
        tracing::debug!(cells = translated, "Applied value translation");
    }

    let record_link = links
        .iter()
        .find(|link| link.castor == RECORD_ID_COLUMN)
        .ok_or_else(|| CastorError::Import("column link has no record_id entry".to_string()))?;
    let record_column = source_column(&source, &record_link.other)?;

    let mut columns = Vec::new();
    for link in links.iter().filter(|link| link.castor != RECORD_ID_COLUMN) {
        let field = study.get_field_by_name(&link.castor).ok_or_else(|| {
            CastorError::Import(format!("'{}' is not a variable of the study", link.castor))
        })?;
        ensure_castorizable(field)?;
        columns.push(LinkedColumn {
            field,
            source: source_column(&source, &link.other)?,
            source_name: &link.other,
            dependency: None,
            fallback: None,
        });
    }
    link_dependencies(study, &mut columns);

    let mut errors = Vec::new();
    let mut rows = Vec::with_capacity(source.len());
    for row in 0..source.len() {
        let record_id = match RecordId::new(source.cell(row, record_column)) {
            Ok(record_id) => record_id.into_inner(),
            Err(reason) => {
                errors.push(CellErrorReport::new(row, RECORD_ID_COLUMN, "", reason));
                String::new()
            }
        };

        let values = castorize_row(study, &source, row, &columns, options)?;
        for (column, value) in columns.iter().zip(&values) {
            if let Castorized::Error { reason, .. } = value {
                let mut report = CellErrorReport::new(
                    row,
                    &column.field.field_name,
                    source.cell(row, column.source),
                    reason,
                );
                if !record_id.is_empty() {
                    report = report.with_record_id(&record_id);
                }
                errors.push(report);
            }
        }
        rows.push(CastorizedRow {
            row,
            record_id,
            values,
        });
    }

    if !errors.is_empty() {
        tracing::warn!(
            rows = rows.len(),
            error_cells = errors.len(),
            "Import batch holds non-viable data"
        );
        return Err(CastorError::NonViableData(errors));
    }

    tracing::info!(
        rows = rows.len(),
        columns = columns.len(),
        "Castorized import batch"
    );
    Ok(CastorizedTable {
        columns: columns
            .iter()
            .map(|column| CastorizedColumn {
                field_id: column.field.field_id.clone(),
                field_name: column.field.field_name.clone(),
                form_id: column.field.form_id.clone(),
                source_column: column.source_name.to_string(),
            })
            .collect(),
        rows,
    })
}

fn source_column(source: &SourceTable, name: &str) -> Result<usize> {
    source
        .column_index(name)
        .ok_or_else(|| CastorError::Import(format!("source has no column '{name}'")))
}

/// Pairs dependent columns with their linked parents
fn link_dependencies<'a>(study: &'a Study, columns: &mut [LinkedColumn<'a>]) {
    let linked: Vec<String> = columns.iter().map(|c| c.field.field_id.clone()).collect();
    let mut fallbacks: HashMap<&str, &str> = HashMap::new();

    for column in columns.iter_mut() {
        let Some(dependency) = study.dependencies().get(&column.field.field_id) else {
            continue;
        };
        if linked.contains(&dependency.parent_field_id) {
            let parent = dependency.parent_field_id.as_str();
            let trigger = dependency.parent_value.as_str();
            column.dependency = Some((parent, trigger));
            fallbacks.insert(parent, trigger);
        }
    }
    for column in columns.iter_mut() {
        column.fallback = fallbacks.get(column.field.field_id.as_str()).copied();
    }
}

fn castorize_row(
    study: &Study,
    source: &SourceTable,
    row: usize,
    columns: &[LinkedColumn<'_>],
    options: &CastorizeOptions,
) -> Result<Vec<Castorized>> {
    let mut values = vec![Castorized::Empty; columns.len()];
    for (index, column) in columns.iter().enumerate() {
        if column.dependency.is_some() {
            continue;
        }
        values[index] = castorize_value(
            column.field,
            source.cell(row, column.source),
            study.optiongroup_for(column.field),
            column.fallback,
            options,
        )?;
    }

    for (index, column) in columns.iter().enumerate() {
        let Some((parent_id, trigger)) = column.dependency else {
            continue;
        };
        let parent = columns
            .iter()
            .position(|c| c.field.field_id == parent_id)
            .map(|position| &values[position]);
        values[index] = match parent {
            Some(parent) => castorize_dependent(
                column.field,
                parent,
                trigger,
                source.cell(row, column.source),
                study.optiongroup_for(column.field),
                options,
            )?,
            None => Castorized::Empty,
        };
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mapping::map_structure;
    use crate::core::mapping::structure::tests::row;
    use crate::domain::{DependencyRegistry, FieldDependency, OptionEntry, OptionGroup, OptionGroupRegistry};

    fn study() -> Study {
        let form = ("Study", "FC1", "Baseline", "1");
        let step = ("S1", "Patient", "1");
        let mut study = map_structure(&[
            row(form, step, ("F1", "pat_sex", "radio", "OG1", "1")),
            row(form, step, ("F2", "pat_height", "numeric", "", "2")),
            row(form, step, ("F3", "his_family", "checkbox", "OG2", "3")),
            row(form, step, ("F4", "his_family_other", "string", "", "4")),
        ])
        .unwrap();

        let entry = |name: &str, value: &str, order| OptionEntry {
            name: name.into(),
            value: value.into(),
            group_order: order,
        };
        study.set_optiongroups(OptionGroupRegistry::from_groups([
            OptionGroup::new("OG1", "Sex", vec![entry("Male", "0", 1), entry("Female", "1", 2)]),
            OptionGroup::new(
                "OG2",
                "Family",
                vec![entry("Diabetes", "1", 1), entry("Other", "5", 2)],
            ),
        ]));
        let mut dependencies = DependencyRegistry::new();
        dependencies.insert(
            "F4",
            FieldDependency {
                parent_field_id: "F3".into(),
                parent_value: "5".into(),
            },
        );
        study.set_dependencies(dependencies);
        study
    }

    fn link(other: &str, castor: &str) -> ColumnLink {
        ColumnLink {
            other: other.into(),
            castor: castor.into(),
        }
    }

    fn source(rows: &[[&str; 3]]) -> SourceTable {
        SourceTable::new(
            vec!["patient".into(), "sex".into(), "height".into()],
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        )
    }

    fn links() -> Vec<ColumnLink> {
        vec![
            link("patient", "record_id"),
            link("sex", "pat_sex"),
            link("height", "pat_height"),
        ]
    }

    #[test]
    fn test_castorize_upload() {
        let table = castorize_upload(
            &study(),
            source(&[["110001", "Male", "180"], ["110002", "Female", ""]]),
            &links(),
            None,
            None,
            &CastorizeOptions::default(),
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].values, vec![Castorized::value("0"), Castorized::value("180")]);
        assert_eq!(
            table.field_values(&table.rows[1]),
            vec![FieldValuePost {
                field_id: "F1".into(),
                field_value: "1".into()
            }]
        );
    }

    #[test]
    fn test_single_error_rejects_batch() {
        let result = castorize_upload(
            &study(),
            source(&[
                ["110001", "Male", "180"],
                ["110002", "Female", "tall"],
                ["", "Male", "170"],
            ]),
            &links(),
            None,
            None,
            &CastorizeOptions::default(),
        );

        let Err(CastorError::NonViableData(errors)) = result else {
            panic!("expected non-viable data");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field_name, "pat_height");
        assert_eq!(errors[0].record_id.as_deref(), Some("110002"));
        assert_eq!(errors[1].field_name, "record_id");
    }

    #[test]
    fn test_translation_before_castorization() {
        let translation = [
            TranslationRow {
                variable: "sex".into(),
                other: "M".into(),
                castor: "Male".into(),
            },
        ];
        let table = castorize_upload(
            &study(),
            source(&[["110001", "M", ""]]),
            &links(),
            Some(&translation),
            None,
            &CastorizeOptions::default(),
        )
        .unwrap();
        assert_eq!(table.rows[0].values[0], Castorized::value("0"));
    }

    #[test]
    fn test_merge_with_dependent_fallback() {
        let source = SourceTable::new(
            vec!["patient".into(), "diabetes".into(), "gout".into(), "other".into()],
            vec![vec!["110001".into(), "yes".into(), "yes".into(), "Gout".into()]],
        );
        let merge: Vec<MergeRow> = [("diabetes", "Diabetes"), ("gout", "Gout")]
            .into_iter()
            .map(|(column, value)| MergeRow {
                other_variable: column.into(),
                other_value: "yes".into(),
                castor_variable: "his_family".into(),
                castor_value: value.into(),
            })
            .collect();

        let table = castorize_upload(
            &study(),
            source,
            &[link("patient", "record_id"), link("other", "his_family_other")],
            None,
            Some(&merge),
            &CastorizeOptions::default(),
        )
        .unwrap();

        let family = table.column("his_family").unwrap();
        let other = table.column("his_family_other").unwrap();
        assert_eq!(table.rows[0].values[family], Castorized::value("1;5"));
        assert_eq!(table.rows[0].values[other], Castorized::value("Gout"));
    }

    #[test]
    fn test_missing_record_link() {
        let result = castorize_upload(
            &study(),
            source(&[]),
            &[link("sex", "pat_sex")],
            None,
            None,
            &CastorizeOptions::default(),
        );
        assert!(matches!(result, Err(CastorError::Import(_))));
    }

    #[test]
    fn test_unknown_variable() {
        let result = castorize_upload(
            &study(),
            source(&[]),
            &[link("patient", "record_id"), link("sex", "pat_gender")],
            None,
            None,
            &CastorizeOptions::default(),
        );
        assert!(matches!(result, Err(CastorError::Import(_))));
    }
}
