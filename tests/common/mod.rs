//! Shared fixtures for integration tests
//!
//! [`MemorySource`] is an in-memory [`StudySource`] holding a small study with
//! one Study form, one Report form and one Survey form.

#![allow(dead_code)]

use async_trait::async_trait;
use castor_edc::adapters::castor::models::{
    CastorDate, InstituteRef, RecordEmbedded, ReportRef, SurveyInstanceRef, SurveyPackageEmbedded,
};
use castor_edc::adapters::castor::{
    FieldDependencyModel, FieldValuePost, RecordModel, ReportInstanceModel, StudySource,
    SurveyModel, SurveyPackageInstanceModel, UploadResponse, UploadTarget,
};
use castor_edc::domain::{
    ApiError, CastorError, DataRow, OptionEntry, OptionGroup, Result, StructureRow,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const STUDY_ID: &str = "D234215B";

/// One `post_field_values` call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpload {
    pub record_id: String,
    pub target: UploadTarget,
    pub values: Vec<FieldValuePost>,
    pub change_reason: String,
}

/// In-memory study source that records every write
pub struct MemorySource {
    pub structure: Vec<StructureRow>,
    pub data: Vec<DataRow>,
    pub optiongroups: Vec<OptionGroup>,
    pub dependencies: Vec<FieldDependencyModel>,
    pub surveys: Vec<SurveyModel>,
    pub report_instances: Vec<ReportInstanceModel>,
    pub records: Vec<RecordModel>,
    pub packages: Vec<SurveyPackageInstanceModel>,
    /// Records whose uploads fail with an API error
    pub failing_records: Vec<String>,
    pub uploads: Mutex<Vec<RecordedUpload>>,
    pub created_instances: Mutex<Vec<(String, String, String)>>,
    next_instance: AtomicUsize,
}

impl MemorySource {
    /// The sample study with its data
    pub fn sample() -> Self {
        Self {
            structure: sample_structure(),
            data: sample_data(),
            optiongroups: sample_optiongroups(),
            dependencies: vec![FieldDependencyModel {
                child_id: "F4".to_string(),
                parent_id: "F3".to_string(),
                value: "5".to_string(),
            }],
            surveys: vec![SurveyModel {
                id: "SV1".to_string(),
                name: "QOL Survey".to_string(),
            }],
            report_instances: vec![report_instance("RI-1", "110001", "FC2", false)],
            records: vec![
                record("110001", Some("Amsterdam"), Some("Treatment")),
                record("110002", Some("Utrecht"), None),
                // Not in the data export; ignored
                record("999999", Some("Nowhere"), None),
            ],
            packages: vec![SurveyPackageInstanceModel {
                id: "SP-1".to_string(),
                survey_package_id: Some("PKG-1".to_string()),
                progress: Some(100),
                created_on: Some(date("2024-01-12 08:00:00.000000")),
                sent_on: Some(date("2024-01-12 08:05:00.000000")),
                finished_on: Some(date("2024-01-13 19:45:12.345000")),
                embedded: SurveyPackageEmbedded {
                    survey_instances: vec![SurveyInstanceRef {
                        id: "SI-1".to_string(),
                    }],
                },
            }],
            failing_records: Vec::new(),
            uploads: Mutex::new(Vec::new()),
            created_instances: Mutex::new(Vec::new()),
            next_instance: AtomicUsize::new(1),
        }
    }

    /// The sample structure without any records
    pub fn empty_study() -> Self {
        Self {
            data: Vec::new(),
            report_instances: Vec::new(),
            records: Vec::new(),
            packages: Vec::new(),
            ..Self::sample()
        }
    }

    pub fn with_failing_record(mut self, record_id: &str) -> Self {
        self.failing_records.push(record_id.to_string());
        self
    }

    pub fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        let mut uploads = self.uploads.lock().unwrap().clone();
        uploads.sort_by(|a, b| a.record_id.cmp(&b.record_id));
        uploads
    }

    pub fn recorded_instances(&self) -> Vec<(String, String, String)> {
        let mut instances = self.created_instances.lock().unwrap().clone();
        instances.sort();
        instances
    }
}

#[async_trait]
impl StudySource for MemorySource {
    fn study_id(&self) -> &str {
        STUDY_ID
    }

    async fn fetch_structure(&self) -> Result<Vec<StructureRow>> {
        Ok(self.structure.clone())
    }

    async fn fetch_data(&self) -> Result<Vec<DataRow>> {
        Ok(self.data.clone())
    }

    async fn fetch_optiongroups(&self) -> Result<Vec<OptionGroup>> {
        Ok(self.optiongroups.clone())
    }

    async fn fetch_field_dependencies(&self) -> Result<Vec<FieldDependencyModel>> {
        Ok(self.dependencies.clone())
    }

    async fn fetch_surveys(&self) -> Result<Vec<SurveyModel>> {
        Ok(self.surveys.clone())
    }

    async fn fetch_report_instances(&self, archived: bool) -> Result<Vec<ReportInstanceModel>> {
        Ok(self
            .report_instances
            .iter()
            .filter(|instance| archived || !instance.archived)
            .cloned()
            .collect())
    }

    async fn fetch_records(&self) -> Result<Vec<RecordModel>> {
        Ok(self.records.clone())
    }

    async fn fetch_survey_package_instances(&self) -> Result<Vec<SurveyPackageInstanceModel>> {
        Ok(self.packages.clone())
    }

    async fn create_report_instance(
        &self,
        record_id: &str,
        report_id: &str,
        instance_name: &str,
    ) -> Result<String> {
        let id = format!("NEW-{}", self.next_instance.fetch_add(1, Ordering::SeqCst));
        self.created_instances.lock().unwrap().push((
            record_id.to_string(),
            report_id.to_string(),
            instance_name.to_string(),
        ));
        Ok(id)
    }

    async fn post_field_values(
        &self,
        record_id: &str,
        target: &UploadTarget,
        values: &[FieldValuePost],
        change_reason: &str,
    ) -> Result<UploadResponse> {
        if self.failing_records.iter().any(|id| id == record_id) {
            return Err(CastorError::Api(ApiError::NotFound(format!(
                "record {record_id}"
            ))));
        }
        self.uploads.lock().unwrap().push(RecordedUpload {
            record_id: record_id.to_string(),
            target: target.clone(),
            values: values.to_vec(),
            change_reason: change_reason.to_string(),
        });
        Ok(UploadResponse {
            total_success: values.len(),
            total_failed: 0,
            failed: Vec::new(),
        })
    }
}

pub fn date(text: &str) -> CastorDate {
    CastorDate {
        date: text.to_string(),
        timezone: Some("Europe/Amsterdam".to_string()),
    }
}

pub fn report_instance(id: &str, record_id: &str, report_id: &str, archived: bool) -> ReportInstanceModel {
    ReportInstanceModel {
        id: id.to_string(),
        name: Some(format!("Adverse Event - {id}")),
        record_id: Some(record_id.to_string()),
        archived,
        created_on: Some(date("2024-01-15 10:30:00.000000")),
        parent_id: None,
        report: Some(ReportRef {
            id: report_id.to_string(),
        }),
        embedded: None,
    }
}

pub fn record(id: &str, institute: Option<&str>, group: Option<&str>) -> RecordModel {
    RecordModel {
        id: id.to_string(),
        randomization_group_name: group.map(str::to_string),
        randomized_on: group.map(|_| date("2024-01-10 09:00:00.000000")),
        archived: false,
        embedded: RecordEmbedded {
            institute: institute.map(|name| InstituteRef {
                name: name.to_string(),
            }),
        },
    }
}

#[allow(clippy::too_many_arguments)]
pub fn structure_row(
    form: (&str, &str, &str, &str),
    step: (&str, &str, &str),
    field_id: &str,
    field_name: &str,
    field_type: &str,
    option_group: &str,
    order: &str,
) -> StructureRow {
    StructureRow {
        form_type: form.0.to_string(),
        form_id: form.1.to_string(),
        form_name: form.2.to_string(),
        form_order: form.3.to_string(),
        step_id: step.0.to_string(),
        step_name: step.1.to_string(),
        step_order: step.2.to_string(),
        field_id: field_id.to_string(),
        field_name: field_name.to_string(),
        field_label: field_name.replace('_', " "),
        field_type: field_type.to_string(),
        field_required: "0".to_string(),
        field_option_group: option_group.to_string(),
        field_order: order.to_string(),
        field_min: String::new(),
        field_max: String::new(),
    }
}

/// Baseline (Study), Adverse Event (Report) and QOL Survey (Survey)
pub fn sample_structure() -> Vec<StructureRow> {
    let baseline = ("Study", "FC1", "Baseline", "1");
    let demographics = ("S1", "Demographics", "1");
    let history = ("S2", "History", "2");
    let adverse_event = ("Report", "FC2", "Adverse Event", "2");
    let ae_step = ("S3", "Event", "1");
    let survey = ("Survey", "SV1", "QOL Survey", "3");
    let survey_step = ("S4", "Questions", "1");

    vec![
        structure_row(baseline, demographics, "F2", "pat_height", "numeric", "", "2"),
        structure_row(baseline, demographics, "F1", "pat_sex", "radio", "OG1", "1"),
        structure_row(baseline, demographics, "F9", "pat_intro", "remark", "", "0"),
        structure_row(baseline, history, "F3", "his_family", "checkbox", "OG2", "1"),
        structure_row(baseline, history, "F4", "his_family_other", "string", "", "2"),
        structure_row(adverse_event, ae_step, "F5", "ae_description", "string", "", "1"),
        structure_row(adverse_event, ae_step, "F6", "ae_date", "date", "", "2"),
        structure_row(survey, survey_step, "F7", "qol_score", "numeric", "", "1"),
    ]
}

pub fn sample_optiongroups() -> Vec<OptionGroup> {
    vec![
        OptionGroup::new(
            "OG1",
            "Sex",
            vec![option("Male", "1", 1), option("Female", "2", 2)],
        ),
        OptionGroup::new(
            "OG2",
            "Family history",
            vec![option("Diabetes", "1", 1), option("Other", "5", 2)],
        ),
    ]
}

fn option(name: &str, value: &str, group_order: i64) -> OptionEntry {
    OptionEntry {
        name: name.to_string(),
        value: value.to_string(),
        group_order,
    }
}

pub fn data_row(
    record_id: &str,
    form_type: &str,
    instance: (&str, &str),
    field_id: &str,
    value: &str,
) -> DataRow {
    DataRow {
        record_id: record_id.to_string(),
        form_type: form_type.to_string(),
        form_instance_id: instance.0.to_string(),
        form_instance_name: instance.1.to_string(),
        field_id: field_id.to_string(),
        value: value.to_string(),
        date: "2024-01-15 10:30:00".to_string(),
    }
}

pub fn sample_data() -> Vec<DataRow> {
    let study = ("", "");
    let report = ("RI-1", "Adverse Event - 1");
    let survey = ("SI-1", "QOL Survey");

    vec![
        data_row("110001", "Study", study, "F1", "1"),
        data_row("110001", "Study", study, "F2", "182.5"),
        data_row("110001", "Study", study, "F3", "1;5"),
        data_row("110001", "Study", study, "F4", "Gout"),
        data_row("110002", "Study", study, "F1", "Missing (not done)"),
        data_row("110002", "Study", study, "F2", "Missing (asked but unknown)"),
        data_row("110002", "Study", study, "F3", "abc"),
        data_row("110001", "Report", report, "F5", "Headache"),
        data_row("110001", "Report", report, "F6", "15-01-2024"),
        data_row("110001", "Survey", survey, "F7", "7"),
        // Record without any data
        data_row("110003", "", ("", ""), "", ""),
    ]
}
