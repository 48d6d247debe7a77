//! Upload of castorized rows
//!
//! Rows are uploaded independently, at most `max_concurrency` at a time.
//! Feedback arrives in completion order and is re-sorted by source row.

use super::prepare::{CastorizedRow, CastorizedTable};
use crate::adapters::castor::{FailedDataPoint, StudySource, UploadTarget};
use crate::config::ImportConfig;
use crate::domain::{CastorError, Form, FormType, Result, Study};
use futures::stream::{self, StreamExt};
use std::time::{Duration, Instant};

/// Where the rows of a table are uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPlan {
    /// Study forms of each row's record
    Study,
    /// A new instance of this report per row
    Report { report_id: String, report_name: String },
}

impl UploadPlan {
    /// Decides the target from the forms of the linked fields
    ///
    /// # Errors
    ///
    /// Returns [`CastorError::Import`] for survey fields, for fields spread
    /// over several reports, or for a mix of study and report fields.
    pub fn for_table(study: &Study, table: &CastorizedTable) -> Result<Self> {
        let mut forms: Vec<&Form> = Vec::new();
        for column in &table.columns {
            let form = study.get_form(&column.form_id).ok_or_else(|| {
                CastorError::structural(format!(
                    "field '{}' belongs to unknown form '{}'",
                    column.field_name, column.form_id
                ))
            })?;
            if !forms.iter().any(|f| f.form_id == form.form_id) {
                forms.push(form);
            }
        }

        if forms.iter().all(|form| form.form_type == FormType::Study) {
            return Ok(UploadPlan::Study);
        }
        match forms.as_slice() {
            [form] if form.form_type == FormType::Report => Ok(UploadPlan::Report {
                report_id: form.form_id.clone(),
                report_name: form.form_name.clone(),
            }),
            _ => {
                let names: Vec<String> = forms
                    .iter()
                    .map(|form| format!("{} ({})", form.form_name, form.form_type.as_str()))
                    .collect();
                Err(CastorError::Import(format!(
                    "linked fields must all belong to study forms or to one report, found: {}",
                    names.join(", ")
                )))
            }
        }
    }
}

/// Settings for one upload run
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub max_concurrency: usize,
    pub change_reason: String,
    /// Log what would be uploaded without calling the API
    pub dry_run: bool,
}

impl UploadOptions {
    pub fn from_config(config: &ImportConfig, dry_run: bool) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            change_reason: config.change_reason.clone(),
            dry_run,
        }
    }
}

/// Outcome of uploading one source row
#[derive(Debug, Clone, PartialEq)]
pub struct RowFeedback {
    pub row: usize,
    pub record_id: String,
    /// Report instance created for the row
    pub instance_id: Option<String>,
    pub succeeded: usize,
    pub failed: Vec<FailedDataPoint>,
    /// Request-level failure; no values of the row were stored
    pub error: Option<String>,
}

impl RowFeedback {
    fn new(row: &CastorizedRow) -> Self {
        Self {
            row: row.row,
            record_id: row.record_id.clone(),
            instance_id: None,
            succeeded: 0,
            failed: Vec::new(),
            error: None,
        }
    }

    pub fn is_successful(&self) -> bool {
        self.error.is_none() && self.failed.is_empty()
    }
}

/// Summary of an import run
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub study_id: String,
    pub rows_total: usize,
    /// Rows without a single value to upload
    pub rows_skipped: usize,
    pub values_succeeded: usize,
    pub values_failed: usize,
    pub dry_run: bool,
    pub duration: Duration,
    /// One entry per uploaded row, in source order
    pub feedback: Vec<RowFeedback>,
}

impl ImportSummary {
    pub fn new(study_id: impl Into<String>, dry_run: bool) -> Self {
        Self {
            study_id: study_id.into(),
            rows_total: 0,
            rows_skipped: 0,
            values_succeeded: 0,
            values_failed: 0,
            dry_run,
            duration: Duration::from_secs(0),
            feedback: Vec::new(),
        }
    }

    pub fn add_feedback(&mut self, feedback: RowFeedback) {
        self.values_succeeded += feedback.succeeded;
        self.values_failed += feedback.failed.len();
        self.feedback.push(feedback);
    }

    /// Rows that hit a request error or had values rejected
    pub fn rows_failed(&self) -> usize {
        self.feedback.iter().filter(|f| !f.is_successful()).count()
    }

    pub fn is_successful(&self) -> bool {
        self.rows_failed() == 0
    }

    pub fn log_summary(&self) {
        tracing::info!(
            study_id = %self.study_id,
            rows = self.rows_total,
            rows_skipped = self.rows_skipped,
            rows_failed = self.rows_failed(),
            values_succeeded = self.values_succeeded,
            values_failed = self.values_failed,
            dry_run = self.dry_run,
            duration_secs = self.duration.as_secs(),
            "Import completed"
        );

        for feedback in self.feedback.iter().filter(|f| !f.is_successful()) {
            if let Some(error) = &feedback.error {
                tracing::warn!(
                    row = feedback.row,
                    record_id = %feedback.record_id,
                    error = %error,
                    "Row upload failed"
                );
            }
            for failed in &feedback.failed {
                tracing::warn!(
                    row = feedback.row,
                    record_id = %feedback.record_id,
                    field_id = failed.field_id.as_deref().unwrap_or("?"),
                    code = failed.code.as_deref().unwrap_or(""),
                    message = failed.message.as_deref().unwrap_or(""),
                    "Value rejected"
                );
            }
        }
    }
}

/// Uploads every row of `table` according to `plan`
///
/// Failures of single rows are recorded in their feedback and do not stop the
/// other rows.
pub async fn upload_table(
    source: &dyn StudySource,
    table: &CastorizedTable,
    plan: &UploadPlan,
    options: &UploadOptions,
) -> ImportSummary {
    let start = Instant::now();
    let mut summary = ImportSummary::new(source.study_id(), options.dry_run);
    summary.rows_total = table.len();

    let rows: Vec<&CastorizedRow> = table
        .rows
        .iter()
        .filter(|row| row.values.iter().any(|value| value.as_wire().is_some()))
        .collect();
    summary.rows_skipped = table.len() - rows.len();

    tracing::info!(
        study_id = %source.study_id(),
        rows = rows.len(),
        max_concurrency = options.max_concurrency,
        dry_run = options.dry_run,
        "Uploading castorized rows"
    );

    let mut feedback: Vec<RowFeedback> = stream::iter(rows)
        .map(|row| upload_row(source, table, row, plan, options))
        .buffer_unordered(options.max_concurrency.max(1))
        .collect()
        .await;
    feedback.sort_by_key(|f| f.row);

    for row in feedback {
        summary.add_feedback(row);
    }
    summary.duration = start.elapsed();
    summary
}

async fn upload_row(
    source: &dyn StudySource,
    table: &CastorizedTable,
    row: &CastorizedRow,
    plan: &UploadPlan,
    options: &UploadOptions,
) -> RowFeedback {
    let mut feedback = RowFeedback::new(row);
    let values = table.field_values(row);

    if options.dry_run {
        tracing::info!(
            row = row.row,
            record_id = %row.record_id,
            values = values.len(),
            target = ?plan,
            "Dry run: skipping upload"
        );
        feedback.succeeded = values.len();
        return feedback;
    }

    let target = match plan {
        UploadPlan::Study => UploadTarget::Study,
        UploadPlan::Report {
            report_id,
            report_name,
        } => {
            let instance_name = format!("{report_name} - row {}", row.row + 1);
            match source
                .create_report_instance(&row.record_id, report_id, &instance_name)
                .await
            {
                Ok(instance_id) => {
                    feedback.instance_id = Some(instance_id.clone());
                    UploadTarget::ReportInstance(instance_id)
                }
                Err(e) => {
                    feedback.error = Some(format!("create report instance: {e}"));
                    return feedback;
                }
            }
        }
    };

    match source
        .post_field_values(&row.record_id, &target, &values, &options.change_reason)
        .await
    {
        Ok(response) => {
            tracing::debug!(
                record_id = %row.record_id,
                succeeded = response.total_success,
                failed = response.total_failed,
                "Uploaded row"
            );
            feedback.succeeded = response.total_success;
            feedback.failed = response.failed;
        }
        Err(e) => feedback.error = Some(e.to_string()),
    }
    feedback
}
