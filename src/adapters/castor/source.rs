//! Study data source trait
//!
//! [`StudySource`] is the seam between the mapping engine and the Castor REST
//! API. [`super::CastorClient`] implements it over HTTP; tests implement it in
//! memory.

use super::models::{
    FieldDependencyModel, FieldValuePost, RecordModel, ReportInstanceModel, SurveyModel,
    SurveyPackageInstanceModel, UploadResponse, UploadTarget,
};
use crate::domain::{DataRow, OptionGroup, Result, StructureRow};
use async_trait::async_trait;

/// Read and write access to one Castor study
///
/// # Example
///
/// ```no_run
/// use castor_edc::adapters::castor::{CastorClient, StudySource};
/// use castor_edc::config::CastorConfig;
///
/// # async fn example() -> castor_edc::domain::Result<()> {
/// let client = CastorClient::connect(CastorConfig::default()).await?;
/// let rows = client.fetch_structure().await?;
/// println!("{} structure rows", rows.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait StudySource: Send + Sync {
    /// Id of the study this source reads
    fn study_id(&self) -> &str;

    /// Flat structure listing, one row per field
    async fn fetch_structure(&self) -> Result<Vec<StructureRow>>;

    /// Flat data listing, one row per (record, instance, field)
    async fn fetch_data(&self) -> Result<Vec<DataRow>>;

    async fn fetch_optiongroups(&self) -> Result<Vec<OptionGroup>>;

    async fn fetch_field_dependencies(&self) -> Result<Vec<FieldDependencyModel>>;

    async fn fetch_surveys(&self) -> Result<Vec<SurveyModel>>;

    /// Report instances; archived ones are included only if `archived` is set
    async fn fetch_report_instances(&self, archived: bool) -> Result<Vec<ReportInstanceModel>>;

    async fn fetch_records(&self) -> Result<Vec<RecordModel>>;

    async fn fetch_survey_package_instances(&self) -> Result<Vec<SurveyPackageInstanceModel>>;

    /// Creates a report instance for a record and returns its id
    async fn create_report_instance(
        &self,
        record_id: &str,
        report_id: &str,
        instance_name: &str,
    ) -> Result<String>;

    /// Uploads field values for one record
    async fn post_field_values(
        &self,
        record_id: &str,
        target: &UploadTarget,
        values: &[FieldValuePost],
        change_reason: &str,
    ) -> Result<UploadResponse>;
}
