//! Domain models and types for castor-edc.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Identifiers** ([`StudyId`], [`RecordId`])
//! - **Structure tree** ([`Study`] → [`Form`] → [`Step`] → [`Field`])
//! - **Data tree** ([`Record`] → [`FormInstance`] → [`DataPoint`])
//! - **Registries** ([`OptionGroupRegistry`], [`DependencyRegistry`], [`LinkTable`])
//! - **Typed values** ([`FieldType`], [`FieldValue`], [`MissingReason`])
//! - **Error types** ([`CastorError`], [`ApiError`]) and the [`Result`] alias
//!
//! # Node storage
//!
//! Every collection in both trees is a [`NodeMap`]: one id-keyed store with a
//! name index kept next to it. Duplicate ids or names are structural errors.
//!
//! ```rust
//! use castor_edc::domain::{Field, FieldType};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let field = Field::builder()
//!     .id("FIELD-1")
//!     .name("pat_sex")
//!     .field_type(FieldType::parse("radio"))
//!     .option_group("OG-1")
//!     .parent("FORM-1", "STEP-1")
//!     .build()?;
//! assert!(field.field_type.is_option_group());
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod errors;
pub mod field_type;
pub mod ids;
pub mod missing;
pub mod node_map;
pub mod optiongroup;
pub mod result;
pub mod structure;
pub mod study;
pub mod value;

// Re-export commonly used types for convenience
pub use data::{DataPoint, DataRow, FormInstance, InstanceMetadata, Record};
pub use errors::{ApiError, CastorError, CellErrorReport};
pub use field_type::FieldType;
pub use ids::{RecordId, StudyId};
pub use missing::MissingReason;
pub use node_map::{Node, NodeMap};
pub use optiongroup::{OptionEntry, OptionGroup, OptionGroupRegistry};
pub use result::Result;
pub use structure::{
    DependencyRegistry, Field, FieldBuilder, FieldDependency, Form, FormType, Step, StructureRow,
};
pub use study::{LinkTable, Study};
pub use value::FieldValue;
