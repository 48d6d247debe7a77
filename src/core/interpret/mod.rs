//! Field value interpretation
//!
//! Turns a data point's raw wire string into a typed [`FieldValue`], dispatching
//! on the field's declared type. Three cases are kept apart:
//!
//! - `""`: never filled in. NaN-like types give [`FieldValue::Absent`], the rest an
//!   empty text value.
//! - `"Missing (<reason>)"`: a deliberate missing-data code, mapped per type to a
//!   numeric code, a placeholder date or the reason label.
//! - Anything else is parsed per type. Unparseable input becomes
//!   [`FieldValue::Error`] rather than an error return.
//!
//! Only an unknown field type is a hard failure.

use crate::domain::missing::{classify, MissingCheck, MissingReason};
use crate::domain::value::{DATETIME_WIRE_FORMAT, DATE_FORMAT, TIME_FORMAT};
use crate::domain::{Field, FieldType, FieldValue, OptionGroup, Result, Study};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Interprets one raw value for `field`
///
/// # Errors
///
/// Returns [`crate::domain::CastorError::UnsupportedFieldType`] if the field's
/// type is outside the known set.
///
/// # Examples
///
/// ```
/// use castor_edc::core::interpret::interpret;
/// use castor_edc::domain::{Field, FieldType, FieldValue};
///
/// # fn example() -> castor_edc::domain::Result<()> {
/// let field = Field::builder()
///     .id("F1")
///     .name("pat_height")
///     .field_type(FieldType::Numeric)
///     .parent("FC1", "S1")
///     .build()?;
///
/// assert_eq!(interpret(&field, "Missing (not done)", None)?, FieldValue::Number(-99.0));
/// assert_eq!(interpret(&field, "", None)?, FieldValue::Absent);
/// # Ok(())
/// # }
/// ```
pub fn interpret(field: &Field, raw: &str, optiongroup: Option<&OptionGroup>) -> Result<FieldValue> {
    field.field_type.ensure_known(&field.field_name)?;

    if raw.is_empty() {
        return Ok(absent_value(&field.field_type));
    }

    let value = match &field.field_type {
        FieldType::String | FieldType::Textarea | FieldType::Upload => {
            FieldValue::Text(raw.to_string())
        }
        FieldType::Calculation => match raw.trim().parse::<f64>() {
            Ok(number) => FieldValue::Number(number),
            Err(_) => FieldValue::Text(raw.to_string()),
        },
        field_type if field_type.is_presentation_only() => {
            FieldValue::error(format!("{field_type} fields hold no data"))
        }
        field_type => match classify(raw) {
            MissingCheck::Missing(reason) => missing_value(field_type, reason),
            MissingCheck::Unrecognized => {
                FieldValue::error(format!("unrecognized missing-data reason in '{raw}'"))
            }
            MissingCheck::Present => parse_present(field_type, raw, optiongroup),
        },
    };
    Ok(value)
}

/// Interprets every data point of every record in place
///
/// Returns the number of data points that interpreted to an error value.
///
/// # Errors
///
/// Fails on the first field with an unsupported type, or on a data point whose
/// field is absent from the structure.
pub fn interpret_study(study: &mut Study) -> Result<usize> {
    let (fields, optiongroups, records) = study.split_records_mut();
    let mut errors = 0;

    for record in records.iter_mut() {
        for instance in record.instances.iter_mut() {
            for point in instance.data_points.iter_mut() {
                let field = fields.get(&point.field_id).ok_or_else(|| {
                    crate::domain::CastorError::structural(format!(
                        "data point references unknown field '{}'",
                        point.field_id
                    ))
                })?;
                let optiongroup = field
                    .option_group
                    .as_deref()
                    .and_then(|id| optiongroups.get(id));
                point.value = interpret(field, &point.raw_value, optiongroup)?;
                if point.value.is_error() {
                    errors += 1;
                    tracing::debug!(
                        record_id = %record.record_id,
                        field = %field.field_name,
                        raw = %point.raw_value,
                        "Value interpreted to error"
                    );
                }
            }
        }
    }

    Ok(errors)
}

/// Value of a never-filled-in field
pub fn absent_value(field_type: &FieldType) -> FieldValue {
    match field_type {
        FieldType::NumberDate => FieldValue::NumberDate(None, None),
        field_type if field_type.is_numeric_family() => FieldValue::Absent,
        _ => FieldValue::Text(String::new()),
    }
}

fn missing_value(field_type: &FieldType, reason: MissingReason) -> FieldValue {
    let code = f64::from(reason.code());
    match field_type {
        FieldType::Checkbox | FieldType::Dropdown | FieldType::Radio => {
            FieldValue::Text(reason.label().to_string())
        }
        FieldType::Date => FieldValue::Date(reason.placeholder_date()),
        FieldType::DateTime => FieldValue::DateTime(reason.placeholder_date().and_time(NaiveTime::default())),
        FieldType::NumberDate => FieldValue::NumberDate(Some(code), Some(reason.placeholder_date())),
        _ => FieldValue::Number(code),
    }
}

fn parse_present(field_type: &FieldType, raw: &str, optiongroup: Option<&OptionGroup>) -> FieldValue {
    match field_type {
        FieldType::Numeric | FieldType::Year | FieldType::Slider | FieldType::Randomization => {
            parse_number(raw).map_or_else(FieldValue::Error, FieldValue::Number)
        }
        FieldType::Checkbox | FieldType::Dropdown | FieldType::Radio => {
            translate_codes(raw, optiongroup)
        }
        FieldType::Date => parse_date(raw).map_or_else(FieldValue::Error, FieldValue::Date),
        FieldType::DateTime => NaiveDateTime::parse_from_str(raw.trim(), DATETIME_WIRE_FORMAT)
            .map_or_else(
                |_| FieldValue::error(format!("'{raw}' is not a dd-mm-yyyy;HH:MM datetime")),
                FieldValue::DateTime,
            ),
        FieldType::Time => NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).map_or_else(
            |_| FieldValue::error(format!("'{raw}' is not a HH:MM time")),
            FieldValue::Time,
        ),
        FieldType::NumberDate => parse_number_date(raw),
        other => FieldValue::error(format!("no interpretation for {other} values")),
    }
}

fn parse_number(raw: &str) -> std::result::Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| format!("'{raw}' is not a number"))
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| format!("'{raw}' is not a dd-mm-yyyy date"))
}

/// Translates `;`-joined wire codes to their labels, joined with `|`
fn translate_codes(raw: &str, optiongroup: Option<&OptionGroup>) -> FieldValue {
    let Some(group) = optiongroup else {
        return FieldValue::error("field has no optiongroup");
    };
    let mut labels = Vec::new();
    for code in raw.split(';') {
        match group.label_for(code.trim()) {
            Some(label) => labels.push(label),
            None => {
                return FieldValue::error(format!(
                    "code '{code}' is not in optiongroup '{}'",
                    group.id
                ))
            }
        }
    }
    FieldValue::Text(labels.join("|"))
}

fn parse_number_date(raw: &str) -> FieldValue {
    let Some((number, date)) = raw.split_once(';') else {
        return FieldValue::error(format!("'{raw}' is not a number;date pair"));
    };
    let number = if number.trim().is_empty() {
        None
    } else {
        match parse_number(number) {
            Ok(number) => Some(number),
            Err(reason) => return FieldValue::Error(reason),
        }
    };
    let date = if date.trim().is_empty() {
        None
    } else {
        match parse_date(date) {
            Ok(date) => Some(date),
            Err(reason) => return FieldValue::Error(reason),
        }
    };
    FieldValue::NumberDate(number, date)
}
