//! Structure and data mapping
//!
//! Turns the flat structure and data exports into the study tree:
//!
//! - [`structure`] - forms, steps, fields and the dependency registry
//! - [`links`] - report and survey instance link table
//! - [`data`] - records, form instances and data points
//! - [`auxiliary`] - record and instance attributes from the REST listings

pub mod auxiliary;
pub mod data;
pub mod links;
pub mod structure;

pub use data::{map_data, DataMappingStats};
pub use links::build_links;
pub use structure::{map_dependencies, map_structure};
