//! Interpreted data point values
//!
//! A [`FieldValue`] is the typed form of a data point's raw wire string. Cell
//! errors are a variant of the value rather than an error type. They are only
//! projected to the literal `"Error"` when a table is rendered.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// Wire and display format for dates
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Wire format for datetimes (`dd-mm-yyyy;HH:MM`)
pub const DATETIME_WIRE_FORMAT: &str = "%d-%m-%Y;%H:%M";

/// Display format for interpreted datetimes
pub const DATETIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Wire and display format for times
pub const TIME_FORMAT: &str = "%H:%M";

/// Sentinel rendered for cells that failed to parse
pub const ERROR_SENTINEL: &str = "Error";

/// Typed value of a single data point
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Never filled in, for types whose absent value is NaN
    Absent,
    /// Free text, option labels, or a missing-data reason label
    Text(String),
    /// Numeric value or missing-data code
    Number(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    /// Composite number and date; an empty half is `None`
    NumberDate(Option<f64>, Option<NaiveDate>),
    /// The raw value could not be interpreted
    Error(String),
}

impl FieldValue {
    /// Creates an error value with a reason
    pub fn error(reason: impl Into<String>) -> Self {
        FieldValue::Error(reason.into())
    }

    /// Whether this value is a cell error
    pub fn is_error(&self) -> bool {
        matches!(self, FieldValue::Error(_))
    }

    /// Whether this value renders as empty
    pub fn is_absent(&self) -> bool {
        match self {
            FieldValue::Absent => true,
            FieldValue::NumberDate(None, None) => true,
            _ => false,
        }
    }

    /// Text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric content, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Renders the value for a table cell; `None` means null
    pub fn render(&self) -> Option<String> {
        match self {
            FieldValue::Absent => None,
            FieldValue::Text(text) => Some(text.clone()),
            FieldValue::Number(number) => Some(format_number(*number)),
            FieldValue::Date(date) => Some(date.format(DATE_FORMAT).to_string()),
            FieldValue::DateTime(datetime) => Some(datetime.format(DATETIME_FORMAT).to_string()),
            FieldValue::Time(time) => Some(time.format(TIME_FORMAT).to_string()),
            FieldValue::NumberDate(number, date) => {
                if number.is_none() && date.is_none() {
                    return None;
                }
                Some(format!(
                    "{};{}",
                    number.map(format_number).unwrap_or_default(),
                    date.map(|d| d.format(DATE_FORMAT).to_string())
                        .unwrap_or_default()
                ))
            }
            FieldValue::Error(_) => Some(ERROR_SENTINEL.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Some(rendered) => f.write_str(&rendered),
            None => f.write_str("NaN"),
        }
    }
}

/// Formats a number without a trailing `.0` when it is integral
pub fn format_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        format!("{number}")
    }
}
