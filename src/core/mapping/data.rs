//! Data tree reconciliation
//!
//! Rebuilds records, form instances and data points from the flat data export.
//! Every entity is found or created on first sight, so row order only matters
//! for which duplicate wins.

use crate::domain::{
    CastorError, DataPoint, DataRow, FormInstance, FormType, Result, Study,
};

/// Counts produced by [`map_data`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataMappingStats {
    pub rows: usize,
    pub data_points: usize,
    pub duplicates: usize,
}

/// Reconciles data export rows into the study's records
///
/// The link table must be in place before this runs.
///
/// # Errors
///
/// Returns a structural integrity error if a row references a field absent
/// from the structure, or an instance that resolves to no form.
pub fn map_data(study: &mut Study, rows: &[DataRow]) -> Result<DataMappingStats> {
    let mut stats = DataMappingStats {
        rows: rows.len(),
        ..Default::default()
    };

    for row in rows {
        let record_id = row.record_id.trim();
        if record_id.is_empty() {
            tracing::warn!("Skipping data row without a record id");
            continue;
        }
        study.record_entry(record_id)?;

        if row.form_type.trim().is_empty() {
            continue;
        }
        let instance_type: FormType = row.form_type.parse()?;

        let field = study.get_single_field(&row.field_id).ok_or_else(|| {
            CastorError::structural(format!(
                "record '{record_id}' has data for field '{}', which is not in the structure",
                row.field_id
            ))
        })?;
        let field_id = field.field_id.clone();
        let field_name = field.field_name.clone();

        let (instance_id, instance_name, form) = match instance_type {
            FormType::Study => {
                let form = study.form_of_field(field).ok_or_else(|| {
                    CastorError::structural(format!(
                        "field '{field_name}' belongs to unknown form '{}'",
                        field.form_id
                    ))
                })?;
                (form.form_id.clone(), form.form_name.clone(), form)
            }
            FormType::Report => (
                row.form_instance_id.clone(),
                row.form_instance_name.clone(),
                study.resolve_instance_form(FormType::Report, &row.form_instance_id)?,
            ),
            FormType::Survey => (
                row.form_instance_id.clone(),
                row.form_instance_name.clone(),
                study.resolve_instance_form(FormType::Survey, &row.form_instance_name)?,
            ),
        };
        let form_id = form.form_id.clone();
        let form_name = form.form_name.clone();

        let record = study.record_entry(record_id)?;
        let instance = record.instances.get_or_insert_with(&instance_id, || {
            Ok(FormInstance::new(
                instance_id.as_str(),
                instance_type,
                instance_name,
                form_id,
                form_name,
            ))
        })?;

        if instance.data_points.contains(&field_id) {
            stats.duplicates += 1;
            tracing::debug!(
                record_id = %record_id,
                instance_id = %instance_id,
                field = %field_name,
                "Ignoring duplicate data row"
            );
            continue;
        }
        instance.data_points.insert(DataPoint::new(
            field_id,
            field_name,
            row.value.as_str(),
            row.date.as_str(),
        ))?;
        stats.data_points += 1;
    }

    tracing::debug!(
        records = study.record_count(),
        data_points = stats.data_points,
        duplicates = stats.duplicates,
        "Data mapped"
    );
    Ok(stats)
}
