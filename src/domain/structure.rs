//! Study structure: forms, steps and fields
//!
//! Castor calls a form a "form collection" and a step a "form" in its exports.
//! This crate uses Form → Step → Field throughout; the renaming happens once, in
//! [`StructureRow`].

use crate::domain::errors::CastorError;
use crate::domain::field_type::FieldType;
use crate::domain::node_map::{Node, NodeMap};
use crate::domain::result::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Type of a form, and of the instances created from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormType {
    Study,
    Survey,
    Report,
}

impl FormType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Study => "Study",
            FormType::Survey => "Survey",
            FormType::Report => "Report",
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormType {
    type Err = CastorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Study" | "study" => Ok(FormType::Study),
            "Survey" | "survey" => Ok(FormType::Survey),
            "Report" | "report" => Ok(FormType::Report),
            other => Err(CastorError::structural(format!("unknown form type '{other}'"))),
        }
    }
}

/// One row of the flat structure export
///
/// The same form and step repeat on every row of their fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureRow {
    #[serde(rename = "Form Type")]
    pub form_type: String,

    #[serde(rename = "Form Collection ID")]
    pub form_id: String,

    #[serde(rename = "Form Collection Name")]
    pub form_name: String,

    #[serde(rename = "Form Collection Order")]
    pub form_order: String,

    #[serde(rename = "Form ID")]
    pub step_id: String,

    #[serde(rename = "Form Name")]
    pub step_name: String,

    #[serde(rename = "Form Order")]
    pub step_order: String,

    #[serde(rename = "Field ID")]
    pub field_id: String,

    #[serde(rename = "Field Variable Name")]
    pub field_name: String,

    #[serde(rename = "Field Label", default)]
    pub field_label: String,

    #[serde(rename = "Field Type")]
    pub field_type: String,

    #[serde(rename = "Field Required", default)]
    pub field_required: String,

    #[serde(rename = "Field Option Group", default)]
    pub field_option_group: String,

    #[serde(rename = "Field Order")]
    pub field_order: String,

    #[serde(rename = "Field Min", default)]
    pub field_min: String,

    #[serde(rename = "Field Max", default)]
    pub field_max: String,
}

/// A field's dependency on a value of another (option-coded) field
///
/// The dependent field is typically a free-text "other, namely" field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDependency {
    pub parent_field_id: String,

    /// Parent wire code that makes the dependent field relevant
    pub parent_value: String,
}

/// Dependencies keyed by the dependent (child) field id
#[derive(Debug, Clone, Default)]
pub struct DependencyRegistry {
    by_child: HashMap<String, FieldDependency>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, child_field_id: impl Into<String>, dependency: FieldDependency) {
        self.by_child.insert(child_field_id.into(), dependency);
    }

    pub fn get(&self, child_field_id: &str) -> Option<&FieldDependency> {
        self.by_child.get(child_field_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldDependency)> {
        self.by_child.iter()
    }

    pub fn len(&self) -> usize {
        self.by_child.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_child.is_empty()
    }
}

/// A single data-collection element
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub field_id: String,
    pub field_name: String,
    pub field_label: String,
    pub field_type: FieldType,
    pub option_group: Option<String>,
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub order: f64,
    pub step_id: String,
    pub form_id: String,
    pub dependency: Option<FieldDependency>,
}

impl Field {
    /// Creates a new builder for constructing a Field
    pub fn builder() -> FieldBuilder {
        FieldBuilder::default()
    }
}

impl Node for Field {
    fn key(&self) -> &str {
        &self.field_id
    }

    /// Presentation fields often carry no variable name and stay out of the name index
    fn name(&self) -> Option<&str> {
        (!self.field_name.is_empty()).then_some(self.field_name.as_str())
    }
}

/// Builder for constructing Field instances
#[derive(Debug, Default)]
pub struct FieldBuilder {
    field_id: Option<String>,
    field_name: Option<String>,
    field_label: Option<String>,
    field_type: Option<FieldType>,
    option_group: Option<String>,
    required: bool,
    min: Option<f64>,
    max: Option<f64>,
    order: f64,
    step_id: Option<String>,
    form_id: Option<String>,
}

impl FieldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, field_id: impl Into<String>) -> Self {
        self.field_id = Some(field_id.into());
        self
    }

    pub fn name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }

    pub fn label(mut self, field_label: impl Into<String>) -> Self {
        self.field_label = Some(field_label.into());
        self
    }

    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// Sets the optiongroup id; an empty id means none
    pub fn option_group(mut self, option_group: impl Into<String>) -> Self {
        let option_group = option_group.into();
        self.option_group = (!option_group.trim().is_empty()).then_some(option_group);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn order(mut self, order: f64) -> Self {
        self.order = order;
        self
    }

    /// Sets the owning step and form
    pub fn parent(mut self, form_id: impl Into<String>, step_id: impl Into<String>) -> Self {
        self.form_id = Some(form_id.into());
        self.step_id = Some(step_id.into());
        self
    }

    /// Builds the Field
    ///
    /// # Errors
    ///
    /// Returns an error if the id, name, type or parent is missing
    pub fn build(self) -> Result<Field> {
        let missing = |what: &str| CastorError::structural(format!("field {what} is required"));
        Ok(Field {
            field_id: self.field_id.ok_or_else(|| missing("id"))?,
            field_name: self.field_name.ok_or_else(|| missing("name"))?,
            field_label: self.field_label.unwrap_or_default(),
            field_type: self.field_type.ok_or_else(|| missing("type"))?,
            option_group: self.option_group,
            required: self.required,
            min: self.min,
            max: self.max,
            order: self.order,
            step_id: self.step_id.ok_or_else(|| missing("step"))?,
            form_id: self.form_id.ok_or_else(|| missing("form"))?,
            dependency: None,
        })
    }
}

/// A page within a form; holds its field ids in insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub step_id: String,
    pub step_name: String,
    pub step_order: f64,
    pub field_ids: Vec<String>,
}

impl Node for Step {
    fn key(&self) -> &str {
        &self.step_id
    }

    fn name(&self) -> Option<&str> {
        Some(&self.step_name)
    }
}

/// A form and its steps
#[derive(Debug, Clone)]
pub struct Form {
    pub form_id: String,
    pub form_name: String,
    pub form_type: FormType,
    pub form_order: f64,
    pub steps: NodeMap<Step>,
}

impl Node for Form {
    fn key(&self) -> &str {
        &self.form_id
    }

    fn name(&self) -> Option<&str> {
        Some(&self.form_name)
    }
}
