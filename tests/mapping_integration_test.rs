//! Integration tests for study mapping and table export
//!
//! These run the full session pipeline over an in-memory study source.

mod common;

use castor_edc::core::export::{write_tables, Cell, ColumnKind};
use castor_edc::core::session::CastorStudy;
use castor_edc::domain::{CastorError, FieldValue, FormType};
use common::{data_row, report_instance, MemorySource};
use std::sync::Arc;
use tempfile::TempDir;

async fn mapped(source: MemorySource) -> CastorStudy {
    let mut study = CastorStudy::new(Arc::new(source));
    study.map_data().await.unwrap();
    study
}

#[tokio::test]
async fn test_map_structure_only() {
    let mut study = CastorStudy::new(Arc::new(MemorySource::sample()));
    study.map_structure().await.unwrap();

    let study = study.study();
    assert_eq!(study.forms().count(), 3);
    assert_eq!(study.field_count(), 8);
    assert_eq!(study.record_count(), 0);
    assert_eq!(study.optiongroups().len(), 2);
    assert_eq!(study.dependencies().len(), 1);
    assert_eq!(study.forms_of_type(FormType::Report).len(), 1);

    let dependents = study.dependents_of("F3");
    assert_eq!(dependents.len(), 1);
    assert_eq!(dependents[0].field_name, "his_family_other");
}

#[tokio::test]
async fn test_map_data_builds_records_and_instances() {
    let mut study = CastorStudy::new(Arc::new(MemorySource::sample()));
    let stats = study.map_data().await.unwrap();

    assert_eq!(stats.rows, 11);
    assert_eq!(stats.data_points, 10);
    assert_eq!(stats.duplicates, 0);

    let study = study.study();
    // 999999 only appears in the record listing
    assert_eq!(study.record_count(), 3);
    assert!(study.get_record("999999").is_none());

    let record = study.get_record("110001").unwrap();
    assert_eq!(record.instances.len(), 3);
    assert_eq!(record.institute.as_deref(), Some("Amsterdam"));
    assert_eq!(record.randomisation_group.as_deref(), Some("Treatment"));

    let baseline = record.instances.get("FC1").unwrap();
    assert_eq!(baseline.instance_type, FormType::Study);
    assert_eq!(
        baseline.data_point("F1").unwrap().value,
        FieldValue::Text("Male".to_string())
    );
    assert_eq!(
        baseline.data_point("F3").unwrap().value,
        FieldValue::Text("Diabetes|Other".to_string())
    );

    let report = record.instances.get("RI-1").unwrap();
    assert_eq!(report.form_id, "FC2");
    assert_eq!(report.instance_name, "Adverse Event - 1");
    assert_eq!(report.metadata.archived, Some(false));

    // Survey instances resolve by survey name
    let survey = record.instances.get("SI-1").unwrap();
    assert_eq!(survey.form_id, "SV1");
    assert_eq!(survey.metadata.progress, Some(100));
    assert_eq!(survey.metadata.survey_package_id.as_deref(), Some("PKG-1"));

    let empty = study.get_record("110003").unwrap();
    assert!(empty.instances.is_empty());
}

#[tokio::test]
async fn test_map_data_interprets_missing_codes() {
    let study = mapped(MemorySource::sample()).await;
    let record = study.study().get_record("110002").unwrap();
    let baseline = record.instances.get("FC1").unwrap();

    assert_eq!(
        baseline.data_point("F1").unwrap().value,
        FieldValue::Text("not done".to_string())
    );
    assert_eq!(baseline.data_point("F2").unwrap().value, FieldValue::Number(-98.0));
    assert!(baseline.data_point("F3").unwrap().value.is_error());
}

#[tokio::test]
async fn test_map_data_is_repeatable() {
    let mut study = CastorStudy::new(Arc::new(MemorySource::sample()));
    let first = study.map_data().await.unwrap();
    let records = study.study().record_count();

    let second = study.map_data().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(study.study().record_count(), records);
    assert_eq!(
        study.study().get_record("110001").unwrap().instances.len(),
        3
    );
}

#[tokio::test]
async fn test_duplicate_rows_keep_first_value() {
    let mut source = MemorySource::sample();
    source
        .data
        .push(data_row("110001", "Study", ("", ""), "F2", "190"));

    let mut study = CastorStudy::new(Arc::new(source));
    let stats = study.map_data().await.unwrap();
    assert_eq!(stats.duplicates, 1);

    let baseline = study
        .study()
        .get_record("110001")
        .unwrap()
        .instances
        .get("FC1")
        .unwrap();
    assert_eq!(baseline.data_point("F2").unwrap().value, FieldValue::Number(182.5));
}

#[tokio::test]
async fn test_unknown_field_is_structural_error() {
    let mut source = MemorySource::sample();
    source
        .data
        .push(data_row("110001", "Study", ("", ""), "F99", "1"));

    let mut study = CastorStudy::new(Arc::new(source));
    let result = study.map_data().await;
    assert!(matches!(result, Err(CastorError::StructuralIntegrity(_))));
}

#[tokio::test]
async fn test_unlisted_report_instance_is_structural_error() {
    let mut source = MemorySource::sample();
    source.data.push(data_row(
        "110002",
        "Report",
        ("RI-404", "Adverse Event - 404"),
        "F5",
        "Rash",
    ));

    let mut study = CastorStudy::new(Arc::new(source));
    let result = study.map_data().await;
    assert!(matches!(result, Err(CastorError::StructuralIntegrity(_))));
}

#[tokio::test]
async fn test_unknown_dependency_parent_is_structural_error() {
    let mut source = MemorySource::sample();
    source.dependencies[0].parent_id = "F404".to_string();

    let mut study = CastorStudy::new(Arc::new(source));
    let result = study.map_structure().await;
    assert!(matches!(result, Err(CastorError::StructuralIntegrity(_))));
}

#[tokio::test]
async fn test_archived_report_instances_excluded_by_default() {
    let mut source = MemorySource::sample();
    source
        .report_instances
        .push(report_instance("RI-2", "110002", "FC2", true));
    source.data.push(data_row(
        "110002",
        "Report",
        ("RI-2", "Adverse Event - 2"),
        "F5",
        "Nausea",
    ));

    let study = mapped(source).await;
    let record = study.study().get_record("110002").unwrap();
    assert!(record.instances.get("RI-2").is_none());

    let tables = study.export_to_tables().unwrap();
    assert_eq!(tables.report("Adverse Event").unwrap().len(), 1);
}

#[tokio::test]
async fn test_archived_report_instances_included_on_request() {
    let mut source = MemorySource::sample();
    source
        .report_instances
        .push(report_instance("RI-2", "110002", "FC2", true));
    source.data.push(data_row(
        "110002",
        "Report",
        ("RI-2", "Adverse Event - 2"),
        "F5",
        "Nausea",
    ));

    let mut study = CastorStudy::new(Arc::new(source)).with_archived_reports(true);
    study.map_data().await.unwrap();

    let tables = study.export_to_tables().unwrap();
    let reports = tables.report("Adverse Event").unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports.cell(1, "instance_id"), Some(&Cell::text("RI-2")));
    assert_eq!(reports.cell(1, "archived"), Some(&Cell::Bool(true)));
}

#[tokio::test]
async fn test_study_table_layout() {
    let study = mapped(MemorySource::sample()).await;
    let tables = study.export_to_tables().unwrap();
    let table = &tables.study;

    let columns: Vec<&str> = table.column_names().collect();
    assert_eq!(
        columns,
        vec![
            "record_id",
            "archived",
            "institute",
            "randomisation_group",
            "randomisation_datetime",
            "pat_sex",
            "pat_height",
            "his_family#Diabetes",
            "his_family#Other",
            "his_family_other",
        ]
    );
    // Remark fields hold no data and get no column
    assert!(table.column("pat_intro").is_none());
    assert!(matches!(
        table.column("pat_sex").unwrap().kind,
        ColumnKind::Categorical(_)
    ));
    assert_eq!(table.column("his_family#Other").unwrap().kind, ColumnKind::Flag);

    // Records are sorted by id
    assert_eq!(table.len(), 3);
    assert_eq!(table.cell(0, "record_id"), Some(&Cell::text("110001")));
    assert_eq!(table.cell(2, "record_id"), Some(&Cell::text("110003")));
}

#[tokio::test]
async fn test_study_table_values() {
    let study = mapped(MemorySource::sample()).await;
    let tables = study.export_to_tables().unwrap();
    let table = &tables.study;

    assert_eq!(table.cell(0, "institute"), Some(&Cell::text("Amsterdam")));
    assert_eq!(
        table.cell(0, "randomisation_datetime"),
        Some(&Cell::text("10-01-2024 09:00:00"))
    );
    assert_eq!(table.cell(0, "pat_sex"), Some(&Cell::text("Male")));
    assert_eq!(table.cell(0, "pat_height"), Some(&Cell::Number(182.5)));
    assert_eq!(table.cell(0, "his_family#Diabetes"), Some(&Cell::Bool(true)));
    assert_eq!(table.cell(0, "his_family#Other"), Some(&Cell::Bool(true)));
    assert_eq!(table.cell(0, "his_family_other"), Some(&Cell::text("Gout")));

    // Missing-data codes
    assert_eq!(table.cell(1, "pat_sex"), Some(&Cell::text("not done")));
    assert_eq!(table.cell(1, "pat_height"), Some(&Cell::Number(-98.0)));
    assert_eq!(table.cell(1, "randomisation_group"), Some(&Cell::Null));

    // Uninterpretable checkbox value
    assert!(table.cell(1, "his_family#Diabetes").unwrap().is_error());
    assert!(table.cell(1, "his_family#Other").unwrap().is_error());
    assert_eq!(table.error_count(), 2);

    // Record without data
    assert_eq!(table.cell(2, "pat_height"), Some(&Cell::Null));
    assert_eq!(table.cell(2, "his_family#Other"), Some(&Cell::Null));
}

#[tokio::test]
async fn test_report_and_survey_tables() {
    let study = mapped(MemorySource::sample()).await;
    let tables = study.export_to_tables().unwrap();

    let reports = tables.report("Adverse Event").unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports.cell(0, "record_id"), Some(&Cell::text("110001")));
    assert_eq!(reports.cell(0, "instance_id"), Some(&Cell::text("RI-1")));
    assert_eq!(
        reports.cell(0, "created_on"),
        Some(&Cell::text("15-01-2024 10:30:00"))
    );
    assert_eq!(reports.cell(0, "parent"), Some(&Cell::Null));
    assert_eq!(reports.cell(0, "ae_description"), Some(&Cell::text("Headache")));
    assert_eq!(reports.cell(0, "ae_date").unwrap().render(), "15-01-2024");

    let surveys = tables.survey("QOL Survey").unwrap();
    assert_eq!(surveys.len(), 1);
    assert_eq!(surveys.cell(0, "survey_package_id"), Some(&Cell::text("PKG-1")));
    assert_eq!(surveys.cell(0, "progress"), Some(&Cell::Integer(100)));
    assert_eq!(
        surveys.cell(0, "completed_on"),
        Some(&Cell::text("13-01-2024 19:45:12"))
    );
    assert_eq!(surveys.cell(0, "qol_score"), Some(&Cell::Number(7.0)));
}

#[tokio::test]
async fn test_empty_study_exports_header_only_tables() {
    let study = mapped(MemorySource::empty_study()).await;
    let tables = study.export_to_tables().unwrap();

    assert!(tables.study.is_empty());
    assert!(tables.report("Adverse Event").unwrap().is_empty());
    assert!(tables.survey("QOL Survey").unwrap().is_empty());
    assert_eq!(tables.iter().count(), 3);
}

#[tokio::test]
async fn test_export_writes_csv_files() {
    let study = mapped(MemorySource::sample()).await;
    let tables = study.export_to_tables().unwrap();
    let dir = TempDir::new().unwrap();

    let paths = write_tables(&tables, dir.path(), b';').unwrap();
    assert_eq!(paths.len(), 3);
    for path in &paths {
        assert!(path.exists(), "{} was not written", path.display());
    }

    let study_csv = std::fs::read_to_string(&paths[0]).unwrap();
    let mut lines = study_csv.lines();
    assert!(lines.next().unwrap().starts_with("record_id;archived;institute"));
    let first = lines.next().unwrap();
    assert!(first.starts_with("110001;False;Amsterdam;Treatment"));
    assert!(first.contains(";True;True;Gout"));
    assert!(study_csv.contains("Error"));
}
