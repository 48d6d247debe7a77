//! Study session: one study, mapped from a [`StudySource`]
//!
//! [`CastorStudy`] owns the in-memory study and rebuilds it on request. Each
//! mapping call starts from an empty study, so calls can be repeated.

use crate::adapters::castor::StudySource;
use crate::adapters::spreadsheet::SourceTable;
use crate::core::export::{export_tables, ExportedTables};
use crate::core::import::{
    castorize_upload, upload_table, CastorizeOptions, CastorizedTable, ColumnLink, ImportSummary,
    MergeRow, TranslationRow, UploadOptions, UploadPlan,
};
use crate::core::interpret::interpret_study;
use crate::core::mapping::auxiliary::{apply_records, apply_report_instances, apply_survey_packages};
use crate::core::mapping::{build_links, map_data, map_dependencies, map_structure, DataMappingStats};
use crate::domain::{OptionGroupRegistry, Result, Study};
use crate::log_mapping_complete;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// A Castor study and the source it is mapped from
pub struct CastorStudy {
    source: Arc<dyn StudySource>,
    study: Study,
    include_archived_reports: bool,
}

impl CastorStudy {
    pub fn new(source: Arc<dyn StudySource>) -> Self {
        Self {
            source,
            study: Study::new(),
            include_archived_reports: false,
        }
    }

    /// Also map data of archived report instances
    pub fn with_archived_reports(mut self, include: bool) -> Self {
        self.include_archived_reports = include;
        self
    }

    pub fn study_id(&self) -> &str {
        self.source.study_id()
    }

    pub fn study(&self) -> &Study {
        &self.study
    }

    /// Rebuilds the form structure, optiongroups and field dependencies
    ///
    /// Any previously mapped data is discarded.
    pub async fn map_structure(&mut self) -> Result<()> {
        let rows = self.source.fetch_structure().await?;
        let mut study = map_structure(&rows)?;

        let optiongroups = self.source.fetch_optiongroups().await?;
        study.set_optiongroups(OptionGroupRegistry::from_groups(optiongroups));

        let dependencies = self.source.fetch_field_dependencies().await?;
        let dependencies = map_dependencies(&study, &dependencies)?;
        study.set_dependencies(dependencies);

        tracing::info!(
            study_id = %self.study_id(),
            forms = study.forms().count(),
            fields = study.field_count(),
            optiongroups = study.optiongroups().len(),
            dependencies = study.dependencies().len(),
            "Mapped study structure"
        );
        self.study = study;
        Ok(())
    }

    /// Rebuilds structure and data, then interprets every value
    pub async fn map_data(&mut self) -> Result<DataMappingStats> {
        let start = Instant::now();
        self.map_structure().await?;

        let surveys = self.source.fetch_surveys().await?;
        // The data export holds rows of archived instances too
        let (report_instances, archived): (Vec<_>, Vec<_>) = self
            .source
            .fetch_report_instances(true)
            .await?
            .into_iter()
            .partition(|instance| self.include_archived_reports || !instance.archived);
        let archived_ids: HashSet<&str> = archived.iter().map(|i| i.id.as_str()).collect();
        let links = build_links(&self.study, &surveys, &report_instances);
        self.study.set_links(links);

        let mut rows = self.source.fetch_data().await?;
        if !archived_ids.is_empty() {
            let before = rows.len();
            rows.retain(|row| {
                !(row.form_type == "Report" && archived_ids.contains(row.form_instance_id.as_str()))
            });
            tracing::debug!(
                archived_instances = archived_ids.len(),
                rows_dropped = before - rows.len(),
                "Dropped data of archived report instances"
            );
        }
        let stats = map_data(&mut self.study, &rows)?;

        let records = self.source.fetch_records().await?;
        let packages = self.source.fetch_survey_package_instances().await?;
        let applied_records = apply_records(&mut self.study, &records);
        let applied_reports = apply_report_instances(&mut self.study, &report_instances);
        let applied_surveys = apply_survey_packages(&mut self.study, &packages);
        tracing::debug!(
            records = applied_records,
            report_instances = applied_reports,
            survey_instances = applied_surveys,
            "Applied auxiliary data"
        );

        let error_values = interpret_study(&mut self.study)?;
        if error_values > 0 {
            tracing::warn!(
                study_id = %self.study_id(),
                error_values,
                "Some values could not be interpreted"
            );
        }
        if stats.duplicates > 0 {
            tracing::warn!(duplicates = stats.duplicates, "Ignored duplicate data rows");
        }

        log_mapping_complete!(
            self.study_id(),
            self.study.record_count(),
            stats.data_points,
            start.elapsed()
        );
        Ok(stats)
    }

    /// One table for study forms, one per survey and one per report
    pub fn export_to_tables(&self) -> Result<ExportedTables> {
        export_tables(&self.study)
    }

    /// Castorizes a source table against the mapped structure
    pub fn castorize_upload(
        &self,
        source: SourceTable,
        links: &[ColumnLink],
        translation: Option<&[TranslationRow]>,
        merge: Option<&[MergeRow]>,
        options: &CastorizeOptions,
    ) -> Result<CastorizedTable> {
        castorize_upload(&self.study, source, links, translation, merge, options)
    }

    /// Uploads castorized rows to the study
    ///
    /// # Errors
    ///
    /// Fails if the linked fields have no single upload target. Failures of
    /// single rows are reported in the summary instead.
    pub async fn upload(
        &self,
        table: &CastorizedTable,
        options: &UploadOptions,
    ) -> Result<ImportSummary> {
        let plan = UploadPlan::for_table(&self.study, table)?;
        Ok(upload_table(self.source.as_ref(), table, &plan, options).await)
    }
}
