//! Instance link table
//!
//! Report instances resolve to their report form by instance id. Survey
//! instances resolve by survey name, because the survey data export carries no
//! survey id.

use crate::adapters::castor::{ReportInstanceModel, SurveyModel};
use crate::domain::{LinkTable, Study};

/// Builds the link table from the survey and report instance listings
///
/// Report instances without a report reference are skipped.
pub fn build_links(
    study: &Study,
    surveys: &[SurveyModel],
    report_instances: &[ReportInstanceModel],
) -> LinkTable {
    let mut links = LinkTable::new();

    for survey in surveys {
        if study.get_form(&survey.id).is_none() {
            tracing::debug!(survey = %survey.name, "Survey has no form in the structure");
        }
        links.insert_survey(survey.name.clone(), survey.id.clone());
    }

    for instance in report_instances {
        match instance.report_id() {
            Some(report_id) => links.insert_report(instance.id.clone(), report_id),
            None => {
                tracing::warn!(instance_id = %instance.id, "Report instance has no report reference")
            }
        }
    }

    tracing::debug!(
        reports = links.report_count(),
        surveys = links.survey_count(),
        "Instance links built"
    );
    links
}
