//! Auxiliary record and instance attributes
//!
//! Institute, randomisation and instance timing come from the record, report
//! instance and survey package listings rather than the data export. They are
//! applied after reconciliation; listing entries for unknown records or
//! instances are ignored.

use crate::adapters::castor::models::CastorDate;
use crate::adapters::castor::{RecordModel, ReportInstanceModel, SurveyPackageInstanceModel};
use crate::domain::value::DATETIME_FORMAT;
use crate::domain::{FormType, Study};
use chrono::NaiveDateTime;
use std::collections::HashMap;

const CASTOR_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a Castor date object, ignoring sub-second precision
pub fn parse_castor_date(date: &CastorDate) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&date.to_seconds(), CASTOR_DATE_FORMAT).ok()
}

/// Castor date rendered in the table datetime format
fn render_castor_date(date: Option<&CastorDate>) -> Option<String> {
    date.and_then(parse_castor_date)
        .map(|datetime| datetime.format(DATETIME_FORMAT).to_string())
}

/// Copies institute, randomisation and archive state onto records
pub fn apply_records(study: &mut Study, records: &[RecordModel]) -> usize {
    let mut applied = 0;
    for model in records {
        let Some(record) = study.get_record_mut(&model.id) else {
            continue;
        };
        record.institute = model.embedded.institute.as_ref().map(|i| i.name.clone());
        record.randomisation_group = model.randomization_group_name.clone();
        record.randomisation_datetime = model.randomized_on.as_ref().and_then(parse_castor_date);
        record.archived = model.archived;
        applied += 1;
    }
    applied
}

/// Copies creation time, parent and archive state onto report instances
pub fn apply_report_instances(study: &mut Study, instances: &[ReportInstanceModel]) -> usize {
    let by_id: HashMap<&str, &ReportInstanceModel> =
        instances.iter().map(|i| (i.id.as_str(), i)).collect();

    let mut applied = 0;
    for record in study.records_mut() {
        for instance in record.instances.iter_mut() {
            if instance.instance_type != FormType::Report {
                continue;
            }
            let Some(model) = by_id.get(instance.instance_id.as_str()) else {
                continue;
            };
            instance.metadata.created_on = render_castor_date(model.created_on.as_ref());
            instance.metadata.archived = Some(model.archived);
            instance.metadata.parent = model.parent_id.clone().filter(|p| !p.is_empty());
            applied += 1;
        }
    }
    applied
}

/// Copies package, timing and progress onto survey instances
///
/// Each package lists the survey instances it contains; every survey instance
/// in a package receives the package's attributes.
pub fn apply_survey_packages(study: &mut Study, packages: &[SurveyPackageInstanceModel]) -> usize {
    let mut by_survey_instance: HashMap<&str, &SurveyPackageInstanceModel> = HashMap::new();
    for package in packages {
        for survey_instance in &package.embedded.survey_instances {
            by_survey_instance.insert(survey_instance.id.as_str(), package);
        }
    }

    let mut applied = 0;
    for record in study.records_mut() {
        for instance in record.instances.iter_mut() {
            if instance.instance_type != FormType::Survey {
                continue;
            }
            let Some(package) = by_survey_instance.get(instance.instance_id.as_str()) else {
                continue;
            };
            let metadata = &mut instance.metadata;
            metadata.survey_package_id = package
                .survey_package_id
                .clone()
                .or_else(|| Some(package.id.clone()));
            metadata.created_on = render_castor_date(package.created_on.as_ref());
            metadata.sent_on = render_castor_date(package.sent_on.as_ref());
            metadata.completed_on = render_castor_date(package.finished_on.as_ref());
            metadata.progress = package.progress;
            applied += 1;
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::castor::models::{
        InstituteRef, RecordEmbedded, SurveyInstanceRef, SurveyPackageEmbedded,
    };
    use crate::domain::FormInstance;

    fn date(text: &str) -> CastorDate {
        CastorDate {
            date: text.to_string(),
            timezone: None,
        }
    }

    fn study_with_instances() -> Study {
        let mut study = Study::new();
        let record = study.record_entry("110001").unwrap();
        record
            .instances
            .insert(FormInstance::new("RI-1", FormType::Report, "Medication - 1", "FC2", "Medication"))
            .unwrap();
        record
            .instances
            .insert(FormInstance::new("SI-1", FormType::Survey, "QOL Survey", "SV1", "QOL Survey"))
            .unwrap();
        study
    }

    #[test]
    fn test_apply_records() {
        let mut study = study_with_instances();
        let models = vec![
            RecordModel {
                id: "110001".to_string(),
                randomization_group_name: Some("Treatment".to_string()),
                randomized_on: Some(date("2021-03-16 10:15:30.000000")),
                archived: false,
                embedded: RecordEmbedded {
                    institute: Some(InstituteRef {
                        name: "Test Institute".to_string(),
                    }),
                },
            },
            RecordModel {
                id: "999999".to_string(),
                randomization_group_name: None,
                randomized_on: None,
                archived: true,
                embedded: RecordEmbedded::default(),
            },
        ];

        assert_eq!(apply_records(&mut study, &models), 1);
        let record = study.get_record("110001").unwrap();
        assert_eq!(record.institute.as_deref(), Some("Test Institute"));
        assert_eq!(record.randomisation_group.as_deref(), Some("Treatment"));
        assert_eq!(
            record.randomisation_datetime.unwrap().format(DATETIME_FORMAT).to_string(),
            "16-03-2021 10:15:30"
        );
    }

    #[test]
    fn test_apply_report_instances() {
        let mut study = study_with_instances();
        let models = vec![ReportInstanceModel {
            id: "RI-1".to_string(),
            name: None,
            record_id: Some("110001".to_string()),
            archived: true,
            created_on: Some(date("2021-03-16 09:00:00.000000")),
            parent_id: Some("FC1".to_string()),
            report: None,
            embedded: None,
        }];

        assert_eq!(apply_report_instances(&mut study, &models), 1);
        let instance = study.get_record("110001").unwrap().instances.get("RI-1").unwrap();
        assert_eq!(instance.metadata.created_on.as_deref(), Some("16-03-2021 09:00:00"));
        assert_eq!(instance.metadata.archived, Some(true));
        assert_eq!(instance.metadata.parent.as_deref(), Some("FC1"));
    }

    #[test]
    fn test_apply_survey_packages() {
        let mut study = study_with_instances();
        let packages = vec![SurveyPackageInstanceModel {
            id: "SPI-1".to_string(),
            survey_package_id: Some("SP-1".to_string()),
            progress: Some(100),
            created_on: Some(date("2021-03-01 08:00:00.000000")),
            sent_on: Some(date("2021-03-01 08:05:00.000000")),
            finished_on: Some(date("2021-03-02 12:00:00.000000")),
            embedded: SurveyPackageEmbedded {
                survey_instances: vec![SurveyInstanceRef {
                    id: "SI-1".to_string(),
                }],
            },
        }];

        assert_eq!(apply_survey_packages(&mut study, &packages), 1);
        let metadata = &study
            .get_record("110001")
            .unwrap()
            .instances
            .get("SI-1")
            .unwrap()
            .metadata;
        assert_eq!(metadata.survey_package_id.as_deref(), Some("SP-1"));
        assert_eq!(metadata.progress, Some(100));
        assert_eq!(metadata.completed_on.as_deref(), Some("02-03-2021 12:00:00"));
    }
}
