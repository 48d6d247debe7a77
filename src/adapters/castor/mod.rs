//! Castor EDC REST API integration
//!
//! - [`CastorClient`] - authenticated HTTP client
//! - [`StudySource`] - the fetch/upload surface the mapping engine consumes
//! - [`models`] - wire models of the REST resources

pub mod client;
pub mod models;
pub mod source;

pub use client::{parse_export_csv, CastorClient};
pub use models::{
    FailedDataPoint, FieldDependencyModel, FieldValuePost, RecordModel, ReportInstanceModel,
    SurveyModel, SurveyPackageInstanceModel, UploadResponse, UploadTarget,
};
pub use source::StudySource;
