//! Optiongroups: ordered (label, wire code) sets used by option-coded fields

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single option of an optiongroup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionEntry {
    /// Human label
    pub name: String,

    /// Wire code
    pub value: String,

    #[serde(rename = "groupOrder", default)]
    pub group_order: i64,
}

/// An optiongroup with options ordered by `group_order`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub options: Vec<OptionEntry>,
}

impl OptionGroup {
    /// Creates an optiongroup, sorting options by their group order
    pub fn new(id: impl Into<String>, name: impl Into<String>, mut options: Vec<OptionEntry>) -> Self {
        options.sort_by_key(|option| option.group_order);
        Self {
            id: id.into(),
            name: name.into(),
            options,
        }
    }

    /// Label for a wire code
    pub fn label_for(&self, code: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.value == code)
            .map(|option| option.name.as_str())
    }

    /// Wire code for a label
    pub fn value_for(&self, label: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.name == label)
            .map(|option| option.value.as_str())
    }

    pub fn has_value(&self, code: &str) -> bool {
        self.options.iter().any(|option| option.value == code)
    }

    /// Labels in group order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|option| option.name.as_str())
    }
}

/// Optiongroups keyed by id
#[derive(Debug, Clone, Default)]
pub struct OptionGroupRegistry {
    groups: HashMap<String, OptionGroup>,
}

impl OptionGroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a bulk fetch
    pub fn from_groups(groups: impl IntoIterator<Item = OptionGroup>) -> Self {
        let mut registry = Self::new();
        for group in groups {
            registry.insert(group);
        }
        registry
    }

    pub fn insert(&mut self, group: OptionGroup) {
        self.groups.insert(group.id.clone(), group);
    }

    pub fn get(&self, id: &str) -> Option<&OptionGroup> {
        self.groups.get(id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
