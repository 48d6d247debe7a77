//! Castor REST API wire models
//!
//! Only the attributes this crate consumes are modelled; serde ignores the rest.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// OAuth client-credentials token response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default)]
    pub token_type: Option<String>,

    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// A page of a HAL collection
///
/// Items live under `_embedded.<key>`; the key differs per endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HalPage {
    #[serde(rename = "_embedded", default)]
    pub embedded: HashMap<String, serde_json::Value>,

    #[serde(default)]
    pub page_count: Option<u32>,

    #[serde(default)]
    pub page: Option<u32>,

    #[serde(default)]
    pub total_items: Option<u64>,
}

/// Castor date object (`{"date": "2019-10-28 13:30:15.000000", ...}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastorDate {
    pub date: String,

    #[serde(default)]
    pub timezone: Option<String>,
}

impl CastorDate {
    /// Date text truncated to whole seconds
    pub fn to_seconds(&self) -> String {
        match self.date.split_once('.') {
            Some((seconds, _)) => seconds.to_string(),
            None => self.date.clone(),
        }
    }
}

/// A field dependency as listed by `/field-dependency`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDependencyModel {
    pub child_id: String,
    pub parent_id: String,

    /// Parent wire code that triggers the child
    pub value: String,
}

/// A survey as listed by `/survey`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyModel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInstanceEmbedded {
    #[serde(default)]
    pub report: Option<ReportRef>,
}

/// A report instance as listed by `/report-instance`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInstanceModel {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub record_id: Option<String>,

    #[serde(default)]
    pub archived: bool,

    #[serde(default)]
    pub created_on: Option<CastorDate>,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub report: Option<ReportRef>,

    #[serde(rename = "_embedded", default)]
    pub embedded: Option<ReportInstanceEmbedded>,
}

impl ReportInstanceModel {
    /// Id of the report form this instance instantiates
    pub fn report_id(&self) -> Option<&str> {
        self.report
            .as_ref()
            .or_else(|| {
                self.embedded
                    .as_ref()
                    .and_then(|embedded| embedded.report.as_ref())
            })
            .map(|report| report.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstituteRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordEmbedded {
    #[serde(default)]
    pub institute: Option<InstituteRef>,
}

/// A record as listed by `/record`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordModel {
    /// Record id; Castor repeats it as `record_id`
    pub id: String,

    #[serde(default)]
    pub randomization_group_name: Option<String>,

    #[serde(default)]
    pub randomized_on: Option<CastorDate>,

    #[serde(default)]
    pub archived: bool,

    #[serde(rename = "_embedded", default)]
    pub embedded: RecordEmbedded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyInstanceRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyPackageEmbedded {
    #[serde(default)]
    pub survey_instances: Vec<SurveyInstanceRef>,
}

/// A survey package instance as listed by `/surveypackageinstance`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyPackageInstanceModel {
    pub id: String,

    #[serde(default)]
    pub survey_package_id: Option<String>,

    #[serde(default)]
    pub progress: Option<i64>,

    #[serde(default)]
    pub created_on: Option<CastorDate>,

    #[serde(default)]
    pub sent_on: Option<CastorDate>,

    #[serde(default)]
    pub finished_on: Option<CastorDate>,

    #[serde(rename = "_embedded", default)]
    pub embedded: SurveyPackageEmbedded,
}

/// Where uploaded field values land
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    /// Study forms of the record
    Study,
    /// An existing report instance
    ReportInstance(String),
}

/// A single field value in an upload request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValuePost {
    pub field_id: String,
    pub field_value: String,
}

/// A field value the server rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedDataPoint {
    #[serde(default)]
    pub field_id: Option<String>,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Response to a data point collection upload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub total_success: usize,

    #[serde(default)]
    pub total_failed: usize,

    #[serde(default)]
    pub failed: Vec<FailedDataPoint>,
}

/// Response to creating a report instance
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedInstance {
    pub id: String,
}
