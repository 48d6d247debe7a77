//! Field type enumeration
//!
//! Castor declares a field's type as a free-form string. It is parsed once into
//! [`FieldType`] at structure-mapping time. Strings outside the known set are kept
//! as [`FieldType::Unknown`], so structure mapping never fails on them. Any
//! attempt to interpret, export or castorize such a field raises
//! [`CastorError::UnsupportedFieldType`] instead.

use crate::domain::errors::CastorError;
use crate::domain::result::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a Castor field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FieldType {
    Numeric,
    Year,
    Slider,
    Randomization,
    Checkbox,
    Dropdown,
    Radio,
    Date,
    DateTime,
    Time,
    NumberDate,
    Calculation,
    String,
    Textarea,
    Upload,
    Remark,
    RepeatedMeasures,
    AddReportButton,
    Summary,
    Image,
    /// A type string this crate has no transformation for
    Unknown(String),
}

impl FieldType {
    /// Parses the wire name of a field type; never fails
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "numeric" => FieldType::Numeric,
            "year" => FieldType::Year,
            "slider" => FieldType::Slider,
            "randomization" => FieldType::Randomization,
            "checkbox" => FieldType::Checkbox,
            "dropdown" => FieldType::Dropdown,
            "radio" => FieldType::Radio,
            "date" => FieldType::Date,
            "datetime" => FieldType::DateTime,
            "time" => FieldType::Time,
            "numberdate" => FieldType::NumberDate,
            "calculation" => FieldType::Calculation,
            "string" => FieldType::String,
            "textarea" => FieldType::Textarea,
            "upload" => FieldType::Upload,
            "remark" => FieldType::Remark,
            "repeated_measures" => FieldType::RepeatedMeasures,
            "add_report_button" => FieldType::AddReportButton,
            "summary" => FieldType::Summary,
            "image" => FieldType::Image,
            other => FieldType::Unknown(other.to_string()),
        }
    }

    /// Wire name of the type
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Numeric => "numeric",
            FieldType::Year => "year",
            FieldType::Slider => "slider",
            FieldType::Randomization => "randomization",
            FieldType::Checkbox => "checkbox",
            FieldType::Dropdown => "dropdown",
            FieldType::Radio => "radio",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Time => "time",
            FieldType::NumberDate => "numberdate",
            FieldType::Calculation => "calculation",
            FieldType::String => "string",
            FieldType::Textarea => "textarea",
            FieldType::Upload => "upload",
            FieldType::Remark => "remark",
            FieldType::RepeatedMeasures => "repeated_measures",
            FieldType::AddReportButton => "add_report_button",
            FieldType::Summary => "summary",
            FieldType::Image => "image",
            FieldType::Unknown(raw) => raw,
        }
    }

    /// Types that never hold data and are left out of exported tables
    pub fn is_presentation_only(&self) -> bool {
        matches!(
            self,
            FieldType::Remark
                | FieldType::RepeatedMeasures
                | FieldType::AddReportButton
                | FieldType::Summary
                | FieldType::Image
        )
    }

    /// Types whose values are codes from an optiongroup
    pub fn is_option_group(&self) -> bool {
        matches!(
            self,
            FieldType::Checkbox | FieldType::Dropdown | FieldType::Radio
        )
    }

    /// Types whose absent value is NaN rather than an empty string
    pub fn is_numeric_family(&self) -> bool {
        matches!(
            self,
            FieldType::Numeric
                | FieldType::Year
                | FieldType::Slider
                | FieldType::Randomization
                | FieldType::Date
                | FieldType::DateTime
                | FieldType::Time
                | FieldType::NumberDate
                | FieldType::Calculation
        )
    }

    /// Returns an error naming the field if the type is unknown
    pub fn ensure_known(&self, field_name: &str) -> Result<()> {
        match self {
            FieldType::Unknown(raw) => Err(CastorError::UnsupportedFieldType {
                field: field_name.to_string(),
                field_type: raw.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Builds the unsupported-type error for this type
    pub fn unsupported(&self, field_name: &str) -> CastorError {
        CastorError::UnsupportedFieldType {
            field: field_name.to_string(),
            field_type: self.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for FieldType {
    fn from(raw: String) -> Self {
        FieldType::parse(&raw)
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}
