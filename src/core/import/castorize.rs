//! Castorization: external spreadsheet values to Castor wire values
//!
//! The inverse of interpretation. Per-cell failures never abort: they become
//! [`Castorized::Error`] so every problem in a batch shows up at once. Only a
//! field type without a defined transformation is a hard error.

use crate::config::ImportConfig;
use crate::domain::value::{
    format_number, DATETIME_FORMAT, DATETIME_WIRE_FORMAT, DATE_FORMAT, ERROR_SENTINEL, TIME_FORMAT,
};
use crate::domain::{Field, FieldType, OptionGroup, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A castorized cell
#[derive(Debug, Clone, PartialEq)]
pub enum Castorized {
    /// Wire value ready for upload
    Value(String),
    /// Nothing to upload
    Empty,
    /// The external value could not be castorized
    Error {
        /// Cell text; `"Error"`, or one sentinel per failing half of a numberdate
        rendered: String,
        reason: String,
    },
}

impl Castorized {
    pub fn value(value: impl Into<String>) -> Self {
        Castorized::Value(value.into())
    }

    /// An error cell rendered as the plain sentinel
    pub fn error(reason: impl Into<String>) -> Self {
        Castorized::Error {
            rendered: ERROR_SENTINEL.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Castorized::Error { .. })
    }

    /// Wire value, if there is one to upload
    pub fn as_wire(&self) -> Option<&str> {
        match self {
            Castorized::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Cell text as shown to a user; empty cells render as `""`
    pub fn render(&self) -> &str {
        match self {
            Castorized::Value(value) => value,
            Castorized::Empty => "",
            Castorized::Error { rendered, .. } => rendered,
        }
    }
}

/// Input formats and optiongroup mode for castorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastorizeOptions {
    /// Optiongroup cells hold labels rather than wire codes
    pub label_data: bool,
    pub date_format: String,
    pub datetime_format: String,
    pub time_format: String,
}

impl Default for CastorizeOptions {
    fn default() -> Self {
        Self::from(&ImportConfig::default())
    }
}

impl From<&ImportConfig> for CastorizeOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            label_data: config.label_data,
            date_format: config.date_format.clone(),
            datetime_format: config.datetime_format.clone(),
            time_format: config.time_format.clone(),
        }
    }
}

/// Castorizes one external value for `field`
///
/// `fallback` is the wire code substituted for unrecognized optiongroup entries;
/// it is set when the field has a dependent "other" field in the same import.
///
/// # Errors
///
/// Returns [`crate::domain::CastorError::UnsupportedFieldType`] for calculation,
/// randomization, upload, presentation-only and unknown types.
///
/// # Examples
///
/// ```
/// use castor_edc::core::import::{castorize_value, Castorized, CastorizeOptions};
/// use castor_edc::domain::{Field, FieldType};
///
/// # fn example() -> castor_edc::domain::Result<()> {
/// let field = Field::builder()
///     .id("F1")
///     .name("pat_birth_year")
///     .field_type(FieldType::Year)
///     .parent("FC1", "S1")
///     .build()?;
/// let options = CastorizeOptions::default();
///
/// assert_eq!(castorize_value(&field, "1984", None, None, &options)?, Castorized::value("1984"));
/// assert!(castorize_value(&field, "1850", None, None, &options)?.is_error());
/// # Ok(())
/// # }
/// ```
pub fn castorize_value(
    field: &Field,
    raw: &str,
    optiongroup: Option<&OptionGroup>,
    fallback: Option<&str>,
    options: &CastorizeOptions,
) -> Result<Castorized> {
    ensure_castorizable(field)?;

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Castorized::Empty);
    }

    let castorized = match &field.field_type {
        FieldType::String | FieldType::Textarea => Castorized::value(raw),
        FieldType::Checkbox | FieldType::Dropdown | FieldType::Radio => {
            castorize_options(trimmed, optiongroup, fallback, options.label_data)
        }
        FieldType::Numeric | FieldType::Slider => castorize_number(trimmed),
        FieldType::Year => castorize_year(trimmed),
        FieldType::Date => castorize_date(trimmed, options),
        FieldType::DateTime => castorize_datetime(trimmed, options),
        FieldType::Time => castorize_time(trimmed, options),
        FieldType::NumberDate => castorize_number_date(trimmed, options),
        other => return Err(other.unsupported(&field.field_name)),
    };
    Ok(castorized)
}

/// Fails for types that have no castorization
pub fn ensure_castorizable(field: &Field) -> Result<()> {
    field.field_type.ensure_known(&field.field_name)?;
    match &field.field_type {
        FieldType::Calculation | FieldType::Randomization | FieldType::Upload => {
            Err(field.field_type.unsupported(&field.field_name))
        }
        field_type if field_type.is_presentation_only() => {
            Err(field_type.unsupported(&field.field_name))
        }
        _ => Ok(()),
    }
}

/// Translates `;`-separated labels (or validates codes) to `;`-joined wire codes
fn castorize_options(
    raw: &str,
    optiongroup: Option<&OptionGroup>,
    fallback: Option<&str>,
    label_data: bool,
) -> Castorized {
    let Some(group) = optiongroup else {
        return Castorized::error("field has no optiongroup");
    };

    let mut codes: Vec<&str> = Vec::new();
    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let code = if label_data {
            group.value_for(entry)
        } else {
            group.has_value(entry).then_some(entry)
        };
        match code.or(fallback) {
            Some(code) => codes.push(code),
            None => {
                let what = if label_data { "label" } else { "value" };
                return Castorized::error(format!(
                    "'{entry}' is not a {what} of optiongroup '{}'",
                    group.name
                ));
            }
        }
    }

    if codes.is_empty() {
        Castorized::Empty
    } else {
        Castorized::value(codes.join(";"))
    }
}

/// Pulls a dependent field's value from the position of the trigger code
///
/// `parent` is the castorized parent cell. The child cell is split on `;` and
/// the entry at the trigger's position is taken; a single-entry child cell is
/// taken whole. No trigger in the parent gives an empty cell. The entry is then
/// castorized with the child field's own type.
///
/// # Errors
///
/// Fails like [`castorize_value`] when the child type has no castorization.
pub fn castorize_dependent(
    child: &Field,
    parent: &Castorized,
    trigger: &str,
    child_raw: &str,
    optiongroup: Option<&OptionGroup>,
    options: &CastorizeOptions,
) -> Result<Castorized> {
    let Some(codes) = parent.as_wire() else {
        return Ok(Castorized::Empty);
    };
    let Some(position) = codes.split(';').position(|code| code == trigger) else {
        return Ok(Castorized::Empty);
    };

    let entries: Vec<&str> = child_raw.split(';').map(str::trim).collect();
    let entry = if entries.len() == 1 {
        entries.first().copied()
    } else {
        entries.get(position).copied()
    };
    match entry {
        Some(entry) if !entry.is_empty() => {
            castorize_value(child, entry, optiongroup, None, options)
        }
        _ => Ok(Castorized::error(format!(
            "no dependent value at position {} of '{child_raw}'",
            position + 1
        ))),
    }
}

fn castorize_number(raw: &str) -> Castorized {
    match raw.parse::<f64>() {
        Ok(number) if number.is_finite() => Castorized::value(format_number(number)),
        _ => Castorized::error(format!("'{raw}' is not a number")),
    }
}

/// Years must lie strictly between 1900 and 2100
fn castorize_year(raw: &str) -> Castorized {
    let year = match raw.parse::<f64>() {
        Ok(year) if year.fract() == 0.0 => year as i64,
        _ => return Castorized::error(format!("'{raw}' is not a year")),
    };
    if year > 1900 && year < 2100 {
        Castorized::value(year.to_string())
    } else {
        Castorized::error(format!("year {year} is outside 1900-2100"))
    }
}

fn parse_with<T>(raw: &str, formats: &[&str], parse: impl Fn(&str, &str) -> Option<T>) -> Option<T> {
    formats.iter().find_map(|format| parse(raw, format))
}

fn castorize_date(raw: &str, options: &CastorizeOptions) -> Castorized {
    parse_with(raw, &[options.date_format.as_str(), DATE_FORMAT], |raw, format| {
        NaiveDate::parse_from_str(raw, format).ok()
    })
    .map(|date| Castorized::value(date.format(DATE_FORMAT).to_string()))
    .unwrap_or_else(|| Castorized::error(format!("'{raw}' is not a date")))
}

fn castorize_datetime(raw: &str, options: &CastorizeOptions) -> Castorized {
    parse_with(
        raw,
        &[
            options.datetime_format.as_str(),
            DATETIME_FORMAT,
            DATETIME_WIRE_FORMAT,
        ],
        |raw, format| NaiveDateTime::parse_from_str(raw, format).ok(),
    )
    .map(|datetime| Castorized::value(datetime.format(DATETIME_WIRE_FORMAT).to_string()))
    .unwrap_or_else(|| Castorized::error(format!("'{raw}' is not a datetime")))
}

fn castorize_time(raw: &str, options: &CastorizeOptions) -> Castorized {
    parse_with(raw, &[options.time_format.as_str(), TIME_FORMAT], |raw, format| {
        NaiveTime::parse_from_str(raw, format).ok()
    })
    .map(|time| Castorized::value(time.format(TIME_FORMAT).to_string()))
    .unwrap_or_else(|| Castorized::error(format!("'{raw}' is not a time")))
}

/// Castorizes each half of `number;date`; a failing half renders as its own sentinel
fn castorize_number_date(raw: &str, options: &CastorizeOptions) -> Castorized {
    let Some((number, date)) = raw.split_once(';') else {
        return Castorized::error(format!("'{raw}' is not a number;date pair"));
    };

    let halves = [
        half(number.trim(), castorize_number),
        half(date.trim(), |d| castorize_date(d, options)),
    ];

    let reasons: Vec<&str> = halves
        .iter()
        .filter_map(|half| match half {
            Castorized::Error { reason, .. } => Some(reason.as_str()),
            _ => None,
        })
        .collect();
    let rendered = format!("{};{}", halves[0].render(), halves[1].render());

    if reasons.is_empty() {
        Castorized::Value(rendered)
    } else {
        Castorized::Error {
            rendered,
            reason: reasons.join(", "),
        }
    }
}

fn half(raw: &str, castorize: impl Fn(&str) -> Castorized) -> Castorized {
    if raw.is_empty() {
        Castorized::Empty
    } else {
        castorize(raw)
    }
}
