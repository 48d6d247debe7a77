//! Collected data: records, form instances and data points

use crate::domain::node_map::{Node, NodeMap};
use crate::domain::structure::FormType;
use crate::domain::value::FieldValue;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One row of the flat data export
///
/// Rows with an empty form type only establish that the record exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    #[serde(rename = "Record ID")]
    pub record_id: String,

    #[serde(rename = "Form Type", default)]
    pub form_type: String,

    #[serde(rename = "Form Instance ID", default)]
    pub form_instance_id: String,

    #[serde(rename = "Form Instance Name", default)]
    pub form_instance_name: String,

    #[serde(rename = "Field ID", default)]
    pub field_id: String,

    #[serde(rename = "Value", default)]
    pub value: String,

    /// When the value was filled in; empty if never
    #[serde(rename = "Date", default)]
    pub date: String,
}

/// A study participant
#[derive(Debug, Clone)]
pub struct Record {
    pub record_id: String,
    pub institute: Option<String>,
    pub randomisation_group: Option<String>,
    pub randomisation_datetime: Option<NaiveDateTime>,
    pub archived: bool,
    pub instances: NodeMap<FormInstance>,
}

impl Record {
    pub fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            institute: None,
            randomisation_group: None,
            randomisation_datetime: None,
            archived: false,
            instances: NodeMap::new(),
        }
    }

    /// Instances of one type, in insertion order
    pub fn instances_of_type(&self, instance_type: FormType) -> impl Iterator<Item = &FormInstance> {
        self.instances
            .iter()
            .filter(move |instance| instance.instance_type == instance_type)
    }
}

impl Node for Record {
    fn key(&self) -> &str {
        &self.record_id
    }

    fn name(&self) -> Option<&str> {
        None
    }
}

/// Auxiliary instance fields, populated after reconciliation
///
/// Reports use `created_on`, `archived` and `parent`. Surveys use `created_on`,
/// `sent_on`, `progress`, `completed_on` and `survey_package_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceMetadata {
    pub created_on: Option<String>,
    pub archived: Option<bool>,
    pub parent: Option<String>,
    pub sent_on: Option<String>,
    pub progress: Option<i64>,
    pub completed_on: Option<String>,
    pub survey_package_id: Option<String>,
}

/// One occurrence of a form for a record
///
/// For Study instances `instance_id` equals the form id. The owning form is
/// resolved when the instance is created and stored in `form_id`.
#[derive(Debug, Clone)]
pub struct FormInstance {
    pub instance_id: String,
    pub instance_type: FormType,
    pub instance_name: String,
    pub form_id: String,
    pub form_name: String,
    pub metadata: InstanceMetadata,
    pub data_points: NodeMap<DataPoint>,
}

impl FormInstance {
    pub fn new(
        instance_id: impl Into<String>,
        instance_type: FormType,
        instance_name: impl Into<String>,
        form_id: impl Into<String>,
        form_name: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            instance_type,
            instance_name: instance_name.into(),
            form_id: form_id.into(),
            form_name: form_name.into(),
            metadata: InstanceMetadata::default(),
            data_points: NodeMap::new(),
        }
    }

    /// Data point of a field, by field id
    pub fn data_point(&self, field_id: &str) -> Option<&DataPoint> {
        self.data_points.get(field_id)
    }
}

impl Node for FormInstance {
    fn key(&self) -> &str {
        &self.instance_id
    }

    fn name(&self) -> Option<&str> {
        None
    }
}

/// One field's recorded value within one form instance
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub field_id: String,
    pub field_name: String,
    pub raw_value: String,
    pub value: FieldValue,
    pub filled_in: Option<String>,
}

impl DataPoint {
    /// Creates an uninterpreted data point; an empty `filled_in` means never
    pub fn new(
        field_id: impl Into<String>,
        field_name: impl Into<String>,
        raw_value: impl Into<String>,
        filled_in: impl Into<String>,
    ) -> Self {
        let filled_in = filled_in.into();
        Self {
            field_id: field_id.into(),
            field_name: field_name.into(),
            raw_value: raw_value.into(),
            value: FieldValue::Absent,
            filled_in: (!filled_in.is_empty()).then_some(filled_in),
        }
    }
}

impl Node for DataPoint {
    fn key(&self) -> &str {
        &self.field_id
    }

    fn name(&self) -> Option<&str> {
        (!self.field_name.is_empty()).then_some(self.field_name.as_str())
    }
}
