//! Study tree to wide tables
//!
//! One table for all Study forms, and one per Survey and per Report form.
//! Auxiliary columns come first, then field columns in (form order, step
//! order, field order). Presentation-only fields are left out.

use super::table::{Cell, Column, ColumnKind, ExportedTables, Table};
use crate::core::interpret::absent_value;
use crate::domain::missing::MissingReason;
use crate::domain::value::{DATETIME_FORMAT, DATE_FORMAT};
use crate::domain::{
    Field, FieldType, FieldValue, Form, FormInstance, FormType, Record, Result, Study,
};
use std::collections::HashSet;

/// How one field spreads over table columns
enum Expansion {
    Plain,
    /// One flag column per option label
    Checkbox(Vec<String>),
    /// `_number` and `_date` columns
    NumberDate,
    /// Categorical column with its domain
    Categorical(HashSet<String>),
}

struct FieldPlan<'a> {
    field: &'a Field,
    expansion: Expansion,
    columns: Vec<Column>,
}

/// Builds every table of the study
///
/// # Errors
///
/// Fails with [`crate::domain::CastorError::UnsupportedFieldType`] if an
/// exported field has a type outside the known set.
pub fn export_tables(study: &Study) -> Result<ExportedTables> {
    let study_forms = study.forms_of_type(FormType::Study);
    let study_table = build_study_table(study, &study_forms)?;

    let surveys = study
        .forms_of_type(FormType::Survey)
        .into_iter()
        .map(|form| build_instance_table(study, form))
        .collect::<Result<Vec<_>>>()?;

    let reports = study
        .forms_of_type(FormType::Report)
        .into_iter()
        .map(|form| build_instance_table(study, form))
        .collect::<Result<Vec<_>>>()?;

    Ok(ExportedTables {
        study: study_table,
        surveys,
        reports,
    })
}

fn build_study_table(study: &Study, forms: &[&Form]) -> Result<Table> {
    let form_ids: HashSet<&str> = forms.iter().map(|form| form.form_id.as_str()).collect();
    let plans = plan_fields(study, |field| form_ids.contains(field.form_id.as_str()))?;

    let mut columns = vec![
        Column::new("record_id", ColumnKind::Auxiliary),
        Column::new("archived", ColumnKind::Auxiliary),
        Column::new("institute", ColumnKind::Auxiliary),
        Column::new("randomisation_group", ColumnKind::Auxiliary),
        Column::new("randomisation_datetime", ColumnKind::Auxiliary),
    ];
    columns.extend(plans.iter().flat_map(|plan| plan.columns.iter().cloned()));
    let mut table = Table::new("Study", columns);

    for record in sorted_records(study) {
        let mut row = vec![
            Cell::text(record.record_id.as_str()),
            Cell::Bool(record.archived),
            optional_text(record.institute.as_deref()),
            optional_text(record.randomisation_group.as_deref()),
            record
                .randomisation_datetime
                .map(|datetime| Cell::text(datetime.format(DATETIME_FORMAT).to_string()))
                .unwrap_or(Cell::Null),
        ];
        for plan in &plans {
            // Study instances are keyed by form id
            let value = record
                .instances
                .get(&plan.field.form_id)
                .and_then(|instance| instance.data_point(&plan.field.field_id))
                .map(|point| &point.value);
            row.extend(field_cells(plan, value));
        }
        table.push_row(row);
    }

    Ok(table)
}

fn build_instance_table(study: &Study, form: &Form) -> Result<Table> {
    let plans = plan_fields(study, |field| field.form_id == form.form_id)?;

    let mut columns = vec![Column::new("record_id", ColumnKind::Auxiliary)];
    columns.extend(
        auxiliary_names(form.form_type)
            .iter()
            .map(|name| Column::new(*name, ColumnKind::Auxiliary)),
    );
    columns.extend(plans.iter().flat_map(|plan| plan.columns.iter().cloned()));
    let mut table = Table::new(form.form_name.as_str(), columns);

    for record in sorted_records(study) {
        for instance in record
            .instances
            .iter()
            .filter(|instance| instance.form_id == form.form_id)
        {
            let mut row = vec![Cell::text(record.record_id.as_str())];
            row.extend(auxiliary_cells(instance));
            for plan in &plans {
                let value = instance
                    .data_point(&plan.field.field_id)
                    .map(|point| &point.value);
                row.extend(field_cells(plan, value));
            }
            table.push_row(row);
        }
    }

    Ok(table)
}

fn auxiliary_names(form_type: FormType) -> &'static [&'static str] {
    match form_type {
        FormType::Report => &[
            "instance_id",
            "instance_name",
            "created_on",
            "parent",
            "archived",
        ],
        FormType::Survey => &[
            "instance_id",
            "survey_package_id",
            "created_on",
            "sent_on",
            "progress",
            "completed_on",
        ],
        FormType::Study => &[],
    }
}

fn auxiliary_cells(instance: &FormInstance) -> Vec<Cell> {
    let metadata = &instance.metadata;
    match instance.instance_type {
        FormType::Report => vec![
            Cell::text(instance.instance_id.as_str()),
            Cell::text(instance.instance_name.as_str()),
            optional_text(metadata.created_on.as_deref()),
            optional_text(metadata.parent.as_deref()),
            metadata.archived.map(Cell::Bool).unwrap_or(Cell::Null),
        ],
        FormType::Survey => vec![
            Cell::text(instance.instance_id.as_str()),
            optional_text(metadata.survey_package_id.as_deref()),
            optional_text(metadata.created_on.as_deref()),
            optional_text(metadata.sent_on.as_deref()),
            metadata.progress.map(Cell::Integer).unwrap_or(Cell::Null),
            optional_text(metadata.completed_on.as_deref()),
        ],
        FormType::Study => Vec::new(),
    }
}

fn sorted_records(study: &Study) -> Vec<&Record> {
    let mut records: Vec<&Record> = study.records().collect();
    records.sort_by(|a, b| a.record_id.cmp(&b.record_id));
    records
}

fn optional_text(value: Option<&str>) -> Cell {
    value.map(Cell::text).unwrap_or(Cell::Null)
}

fn plan_fields<'a, F>(study: &'a Study, filter: F) -> Result<Vec<FieldPlan<'a>>>
where
    F: Fn(&Field) -> bool,
{
    study
        .ordered_fields(|field| filter(field) && !field.field_type.is_presentation_only())
        .into_iter()
        .map(|field| plan_field(study, field))
        .collect()
}

fn plan_field<'a>(study: &'a Study, field: &'a Field) -> Result<FieldPlan<'a>> {
    field.field_type.ensure_known(&field.field_name)?;
    let name = field.field_name.as_str();
    let optiongroup = study.optiongroup_for(field);

    let (expansion, columns) = match (&field.field_type, optiongroup) {
        (FieldType::Checkbox, Some(group)) => {
            let labels: Vec<String> = group.labels().map(str::to_string).collect();
            let columns = labels
                .iter()
                .map(|label| Column::new(format!("{name}#{label}"), ColumnKind::Flag))
                .collect();
            (Expansion::Checkbox(labels), columns)
        }
        (FieldType::Dropdown | FieldType::Radio, Some(group)) => {
            let domain: Vec<String> = group
                .labels()
                .map(str::to_string)
                .chain(MissingReason::ALL.iter().map(|r| r.label().to_string()))
                .collect();
            let column = Column::new(name, ColumnKind::Categorical(domain.clone()));
            (Expansion::Categorical(domain.into_iter().collect()), vec![column])
        }
        (FieldType::NumberDate, _) => (
            Expansion::NumberDate,
            vec![
                Column::new(format!("{name}_number"), ColumnKind::Numeric),
                Column::new(format!("{name}_date"), ColumnKind::Date),
            ],
        ),
        (field_type, _) => (Expansion::Plain, vec![Column::new(name, plain_kind(field_type))]),
    };

    Ok(FieldPlan {
        field,
        expansion,
        columns,
    })
}

fn plain_kind(field_type: &FieldType) -> ColumnKind {
    match field_type {
        FieldType::Numeric
        | FieldType::Slider
        | FieldType::Randomization
        | FieldType::Calculation => ColumnKind::Numeric,
        FieldType::Year => ColumnKind::NullableInt,
        FieldType::Date => ColumnKind::Date,
        FieldType::DateTime => ColumnKind::DateTime,
        FieldType::Time => ColumnKind::Time,
        _ => ColumnKind::Text,
    }
}

/// Cells of one field for one row; `None` means no data point
fn field_cells(plan: &FieldPlan<'_>, value: Option<&FieldValue>) -> Vec<Cell> {
    let absent;
    let value = match value {
        Some(value) => value,
        None => {
            absent = absent_value(&plan.field.field_type);
            &absent
        }
    };

    match &plan.expansion {
        Expansion::Checkbox(labels) => checkbox_cells(labels, value),
        Expansion::NumberDate => number_date_cells(value),
        Expansion::Categorical(domain) => vec![categorical_cell(domain, value)],
        Expansion::Plain if plan.field.field_type == FieldType::Year => vec![year_cell(value)],
        Expansion::Plain => vec![plain_cell(value)],
    }
}

fn plain_cell(value: &FieldValue) -> Cell {
    match value {
        FieldValue::Absent => Cell::Null,
        FieldValue::Error(_) => Cell::error(),
        FieldValue::Number(number) => Cell::Number(*number),
        FieldValue::Text(text) => Cell::text(text.as_str()),
        other => other.render().map(Cell::Text).unwrap_or(Cell::Null),
    }
}

fn year_cell(value: &FieldValue) -> Cell {
    match value {
        FieldValue::Number(number) if number.fract() == 0.0 => Cell::Integer(*number as i64),
        other => plain_cell(other),
    }
}

/// Labels outside the domain become null; the error sentinel is kept
fn categorical_cell(domain: &HashSet<String>, value: &FieldValue) -> Cell {
    match value {
        FieldValue::Error(_) => Cell::error(),
        FieldValue::Text(label) if domain.contains(label) => Cell::text(label.as_str()),
        _ => Cell::Null,
    }
}

/// Splits the `|`-joined labels into one flag per option
///
/// A missing-data label fills every flag with its code; an empty value leaves
/// every flag null.
fn checkbox_cells(labels: &[String], value: &FieldValue) -> Vec<Cell> {
    let fill = |cell: Cell| vec![cell; labels.len()];
    match value {
        FieldValue::Error(_) => fill(Cell::error()),
        FieldValue::Text(text) if text.is_empty() => fill(Cell::Null),
        FieldValue::Text(text) => {
            let checked: Vec<&str> = text.split('|').collect();
            if let Some(reason) = checked.iter().find_map(|label| MissingReason::from_label(label)) {
                return fill(Cell::Integer(i64::from(reason.code())));
            }
            labels
                .iter()
                .map(|label| Cell::Bool(checked.contains(&label.as_str())))
                .collect()
        }
        _ => fill(Cell::Null),
    }
}

fn number_date_cells(value: &FieldValue) -> Vec<Cell> {
    match value {
        FieldValue::NumberDate(number, date) => vec![
            number.map(Cell::Number).unwrap_or(Cell::Null),
            date.map(|date| Cell::text(date.format(DATE_FORMAT).to_string()))
                .unwrap_or(Cell::Null),
        ],
        FieldValue::Error(_) => vec![Cell::error(), Cell::error()],
        _ => vec![Cell::Null, Cell::Null],
    }
}
