//! The study root
//!
//! A [`Study`] owns the whole structure tree, both registries, the instance link
//! table and every record. Trees are never updated incrementally: mapping builds
//! a fresh `Study` and the session replaces the previous one wholesale.

use crate::domain::data::Record;
use crate::domain::errors::CastorError;
use crate::domain::node_map::NodeMap;
use crate::domain::optiongroup::{OptionGroup, OptionGroupRegistry};
use crate::domain::result::Result;
use crate::domain::structure::{DependencyRegistry, Field, Form, FormType, Step};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Resolves Report instances (by instance id) and Survey instances (by survey
/// name) to the id of the form they instantiate
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    reports: HashMap<String, String>,
    surveys: HashMap<String, String>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_report(&mut self, instance_id: impl Into<String>, form_id: impl Into<String>) {
        self.reports.insert(instance_id.into(), form_id.into());
    }

    /// Links a survey by its *name*; the survey data export carries no survey id
    pub fn insert_survey(&mut self, survey_name: impl Into<String>, form_id: impl Into<String>) {
        self.surveys.insert(survey_name.into(), form_id.into());
    }

    /// Form id for a report instance or survey name
    ///
    /// # Errors
    ///
    /// Returns a structural integrity error if the key is not linked, since the
    /// link table and the data export then disagree.
    pub fn resolve<'a>(&'a self, instance_type: FormType, key: &'a str) -> Result<&'a str> {
        let table = match instance_type {
            FormType::Report => &self.reports,
            FormType::Survey => &self.surveys,
            FormType::Study => return Ok(key),
        };
        table.get(key).map(String::as_str).ok_or_else(|| {
            CastorError::structural(format!(
                "{instance_type} instance '{key}' does not link to any form"
            ))
        })
    }

    pub fn report_count(&self) -> usize {
        self.reports.len()
    }

    pub fn survey_count(&self) -> usize {
        self.surveys.len()
    }
}

/// Root of the structure and data trees
#[derive(Debug, Clone, Default)]
pub struct Study {
    forms: NodeMap<Form>,
    fields: NodeMap<Field>,
    step_forms: HashMap<String, String>,
    optiongroups: OptionGroupRegistry,
    dependencies: DependencyRegistry,
    links: LinkTable,
    records: NodeMap<Record>,
}

impl Study {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- structure ----

    /// Returns the form with `form.form_id`, inserting `form` if it is new
    pub fn form_entry(&mut self, form: Form) -> Result<&mut Form> {
        let form_id = form.form_id.clone();
        self.forms.get_or_insert_with(&form_id, || Ok(form))
    }

    /// Returns the step with `step.step_id` in `form_id`, inserting it if new
    ///
    /// # Errors
    ///
    /// Fails if the form is unknown or the step id already belongs to another form.
    pub fn step_entry(&mut self, form_id: &str, step: Step) -> Result<&mut Step> {
        if let Some(owner) = self.step_forms.get(&step.step_id) {
            if owner != form_id {
                return Err(CastorError::structural(format!(
                    "step '{}' appears in forms '{owner}' and '{form_id}'",
                    step.step_id
                )));
            }
        }
        let form = self
            .forms
            .get_mut(form_id)
            .ok_or_else(|| CastorError::structural(format!("unknown form '{form_id}'")))?;
        let step_id = step.step_id.clone();
        self.step_forms.insert(step_id.clone(), form_id.to_string());
        form.steps.get_or_insert_with(&step_id, || Ok(step))
    }

    /// Adds a field to its step
    ///
    /// # Errors
    ///
    /// Fails on a duplicate field id or name, or an unknown owning step.
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        let step = self
            .forms
            .get_mut(&field.form_id)
            .and_then(|form| form.steps.get_mut(&field.step_id))
            .ok_or_else(|| {
                CastorError::structural(format!(
                    "field '{}' references unknown step '{}'",
                    field.field_id, field.step_id
                ))
            })?;
        let field_id = field.field_id.clone();
        self.fields.insert(field)?;
        step.field_ids.push(field_id);
        Ok(())
    }

    pub fn forms(&self) -> impl Iterator<Item = &Form> {
        self.forms.iter()
    }

    pub fn get_form(&self, form_id: &str) -> Option<&Form> {
        self.forms.get(form_id)
    }

    pub fn get_form_by_name(&self, form_name: &str) -> Option<&Form> {
        self.forms.get_by_name(form_name)
    }

    /// Forms of one type, sorted by form order
    pub fn forms_of_type(&self, form_type: FormType) -> Vec<&Form> {
        let mut forms: Vec<&Form> = self
            .forms
            .iter()
            .filter(|form| form.form_type == form_type)
            .collect();
        forms.sort_by(|a, b| a.form_order.total_cmp(&b.form_order));
        forms
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Field by id
    pub fn get_single_field(&self, field_id: &str) -> Option<&Field> {
        self.fields.get(field_id)
    }

    pub fn get_field_by_name(&self, field_name: &str) -> Option<&Field> {
        self.fields.get_by_name(field_name)
    }

    /// Form owning a field
    pub fn form_of_field(&self, field: &Field) -> Option<&Form> {
        self.forms.get(&field.form_id)
    }

    /// Fields matching `filter`, sorted by (form order, step order, field order)
    ///
    /// The sort is stable, so ties keep structure-export order.
    pub fn ordered_fields<F>(&self, filter: F) -> Vec<&Field>
    where
        F: Fn(&Field) -> bool,
    {
        let mut keyed: Vec<((f64, f64, f64), &Field)> = self
            .fields
            .iter()
            .filter(|&field| filter(field))
            .filter_map(|field| {
                let form = self.forms.get(&field.form_id)?;
                let step = form.steps.get(&field.step_id)?;
                Some(((form.form_order, step.step_order, field.order), field))
            })
            .collect();
        keyed.sort_by(|(a, _), (b, _)| compare_orders(a, b));
        keyed.into_iter().map(|(_, field)| field).collect()
    }

    // ---- registries ----

    pub fn set_optiongroups(&mut self, optiongroups: OptionGroupRegistry) {
        self.optiongroups = optiongroups;
    }

    pub fn optiongroups(&self) -> &OptionGroupRegistry {
        &self.optiongroups
    }

    /// Optiongroup of an option-coded field
    pub fn optiongroup_for(&self, field: &Field) -> Option<&OptionGroup> {
        field
            .option_group
            .as_deref()
            .and_then(|id| self.optiongroups.get(id))
    }

    /// Replaces the dependency registry and cross-links it onto fields
    ///
    /// Fields without an entry end up with no dependency.
    pub fn set_dependencies(&mut self, dependencies: DependencyRegistry) {
        for field in self.fields.iter_mut() {
            field.dependency = dependencies.get(&field.field_id).cloned();
        }
        self.dependencies = dependencies;
    }

    pub fn dependencies(&self) -> &DependencyRegistry {
        &self.dependencies
    }

    /// Fields that depend on a value of `parent_field_id`
    pub fn dependents_of(&self, parent_field_id: &str) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|field| {
                field
                    .dependency
                    .as_ref()
                    .is_some_and(|dep| dep.parent_field_id == parent_field_id)
            })
            .collect()
    }

    // ---- links ----

    pub fn set_links(&mut self, links: LinkTable) {
        self.links = links;
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    /// Form instantiated by an instance key
    ///
    /// Study instances key on the form id, Report instances on the instance id
    /// and Survey instances on the survey name.
    ///
    /// # Errors
    ///
    /// Returns a structural integrity error when no form matches.
    pub fn resolve_instance_form(&self, instance_type: FormType, key: &str) -> Result<&Form> {
        let form_id = self.links.resolve(instance_type, key)?;
        self.forms.get(form_id).ok_or_else(|| {
            CastorError::structural(format!(
                "{instance_type} instance '{key}' links to unknown form '{form_id}'"
            ))
        })
    }

    // ---- records ----

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.records.iter_mut()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn get_record(&self, record_id: &str) -> Option<&Record> {
        self.records.get(record_id)
    }

    pub fn get_record_mut(&mut self, record_id: &str) -> Option<&mut Record> {
        self.records.get_mut(record_id)
    }

    /// Splits the study into read-only fields and optiongroups plus mutable records
    pub fn split_records_mut(
        &mut self,
    ) -> (&NodeMap<Field>, &OptionGroupRegistry, &mut NodeMap<Record>) {
        (&self.fields, &self.optiongroups, &mut self.records)
    }

    /// Returns the record, creating it on first sight
    pub fn record_entry(&mut self, record_id: &str) -> Result<&mut Record> {
        self.records
            .get_or_insert_with(record_id, || Ok(Record::new(record_id)))
    }
}

fn compare_orders(a: &(f64, f64, f64), b: &(f64, f64, f64)) -> Ordering {
    a.0.total_cmp(&b.0)
        .then(a.1.total_cmp(&b.1))
        .then(a.2.total_cmp(&b.2))
}
