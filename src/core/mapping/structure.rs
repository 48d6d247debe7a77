//! Structure tree construction
//!
//! The structure export is denormalized: every row describes one field along
//! with its owning step and form. A single pass finds or creates the form and
//! step for each row, then always creates the field.

use crate::adapters::castor::FieldDependencyModel;
use crate::domain::{
    CastorError, DependencyRegistry, Field, FieldDependency, FieldType, Form, FormType, NodeMap,
    Result, Step, StructureRow, Study,
};

/// Builds a fresh study structure from structure export rows
///
/// Registries and links are left empty; the session fills them from their own
/// fetches.
///
/// # Errors
///
/// Returns a structural integrity error for an unparseable order column, an
/// unknown form type, or a duplicate field id or name.
pub fn map_structure(rows: &[StructureRow]) -> Result<Study> {
    let mut study = Study::new();

    for (index, row) in rows.iter().enumerate() {
        // Header is line 1
        let line = index + 2;

        let form_type: FormType = row.form_type.trim().parse()?;
        let form = Form {
            form_id: row.form_id.clone(),
            form_name: row.form_name.clone(),
            form_type,
            form_order: parse_order(&row.form_order, "Form Collection Order", line)?,
            steps: NodeMap::new(),
        };
        study.form_entry(form)?;

        let step = Step {
            step_id: row.step_id.clone(),
            step_name: row.step_name.clone(),
            step_order: parse_order(&row.step_order, "Form Order", line)?,
            field_ids: Vec::new(),
        };
        study.step_entry(&row.form_id, step)?;

        let field = Field::builder()
            .id(row.field_id.trim())
            .name(row.field_name.trim())
            .label(row.field_label.as_str())
            .field_type(FieldType::parse(&row.field_type))
            .option_group(row.field_option_group.as_str())
            .required(parse_required(&row.field_required))
            .bounds(parse_bound(&row.field_min), parse_bound(&row.field_max))
            .order(parse_order(&row.field_order, "Field Order", line)?)
            .parent(row.form_id.as_str(), row.step_id.as_str())
            .build()?;

        if let FieldType::Unknown(raw) = &field.field_type {
            tracing::warn!(
                field = %field.field_name,
                field_type = %raw,
                "Field has an unsupported type"
            );
        }

        study.add_field(field)?;
    }

    tracing::debug!(
        forms = study.forms().count(),
        fields = study.field_count(),
        "Structure mapped"
    );
    Ok(study)
}

/// Builds the dependency registry, keyed by child field id
///
/// # Errors
///
/// Fails if a dependency names a parent field absent from the structure.
pub fn map_dependencies(
    study: &Study,
    dependencies: &[FieldDependencyModel],
) -> Result<DependencyRegistry> {
    let mut registry = DependencyRegistry::new();
    for dependency in dependencies {
        if study.get_single_field(&dependency.parent_id).is_none() {
            return Err(CastorError::structural(format!(
                "dependency of field '{}' references unknown parent field '{}'",
                dependency.child_id, dependency.parent_id
            )));
        }
        registry.insert(
            dependency.child_id.clone(),
            FieldDependency {
                parent_field_id: dependency.parent_id.clone(),
                parent_value: dependency.value.clone(),
            },
        );
    }
    Ok(registry)
}

fn parse_order(raw: &str, column: &str, line: usize) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed.parse::<f64>().map_err(|_| {
        CastorError::structural(format!(
            "line {line}: column '{column}' holds '{raw}', which is not a number"
        ))
    })
}

fn parse_required(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

/// Field bounds are advisory; unparseable bounds are dropped
fn parse_bound(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}
