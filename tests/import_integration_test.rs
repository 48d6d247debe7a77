//! Integration tests for castorization and upload
//!
//! Structure comes from the in-memory study source; uploads are recorded by it.

mod common;

use castor_edc::adapters::castor::{FieldValuePost, UploadTarget};
use castor_edc::adapters::spreadsheet::{read_records, read_table, SourceTable};
use castor_edc::core::import::{
    CastorizeOptions, ColumnLink, MergeRow, TranslationRow, UploadOptions,
};
use castor_edc::core::session::CastorStudy;
use castor_edc::domain::CastorError;
use common::MemorySource;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn links(pairs: &[(&str, &str)]) -> Vec<ColumnLink> {
    pairs
        .iter()
        .map(|(other, castor)| ColumnLink {
            other: other.to_string(),
            castor: castor.to_string(),
        })
        .collect()
}

fn table(headers: &[&str], rows: &[&[&str]]) -> SourceTable {
    SourceTable::new(
        headers.iter().map(|h| h.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect(),
    )
}

fn upload_options(dry_run: bool) -> UploadOptions {
    UploadOptions {
        max_concurrency: 4,
        change_reason: "Migration from registry".to_string(),
        dry_run,
    }
}

fn values_by_field(values: &[FieldValuePost]) -> HashMap<&str, &str> {
    values
        .iter()
        .map(|v| (v.field_id.as_str(), v.field_value.as_str()))
        .collect()
}

async fn structured(source: Arc<MemorySource>) -> CastorStudy {
    let mut study = CastorStudy::new(source);
    study.map_structure().await.unwrap();
    study
}

fn baseline_source() -> SourceTable {
    table(
        &["patient", "sex", "height", "family", "family_other"],
        &[
            &["110001", "Male", "182.5", "Diabetes;Other", "Gout"],
            &["110002", "Female", "170", "", ""],
            &["110003", "", "", "", ""],
        ],
    )
}

fn baseline_links() -> Vec<ColumnLink> {
    links(&[
        ("patient", "record_id"),
        ("sex", "pat_sex"),
        ("height", "pat_height"),
        ("family", "his_family"),
        ("family_other", "his_family_other"),
    ])
}

#[tokio::test]
async fn test_castorize_and_upload_study_forms() {
    let source = Arc::new(MemorySource::sample());
    let study = structured(source.clone()).await;

    let table = study
        .castorize_upload(
            baseline_source(),
            &baseline_links(),
            None,
            None,
            &CastorizeOptions::default(),
        )
        .unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.columns.len(), 4);

    let summary = study.upload(&table, &upload_options(false)).await.unwrap();
    assert_eq!(summary.rows_total, 3);
    assert_eq!(summary.rows_skipped, 1);
    assert_eq!(summary.values_succeeded, 6);
    assert_eq!(summary.values_failed, 0);
    assert!(summary.is_successful());
    assert_eq!(summary.feedback.len(), 2);
    assert_eq!(summary.feedback[0].record_id, "110001");

    let uploads = source.recorded_uploads();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].target, UploadTarget::Study);
    assert_eq!(uploads[0].change_reason, "Migration from registry");

    let first = values_by_field(&uploads[0].values);
    assert_eq!(first["F1"], "1");
    assert_eq!(first["F2"], "182.5");
    assert_eq!(first["F3"], "1;5");
    assert_eq!(first["F4"], "Gout");

    let second = values_by_field(&uploads[1].values);
    assert_eq!(second.len(), 2);
    assert_eq!(second["F1"], "2");
    assert_eq!(second["F2"], "170");
    assert!(source.recorded_instances().is_empty());
}

#[tokio::test]
async fn test_non_viable_batch_uploads_nothing() {
    let source = Arc::new(MemorySource::sample());
    let study = structured(source.clone()).await;

    let input = table(
        &["patient", "sex", "height"],
        &[
            &["110001", "Male", "tall"],
            &["110002", "Unknown", "170"],
            &["", "Female", "165"],
        ],
    );
    let links = links(&[
        ("patient", "record_id"),
        ("sex", "pat_sex"),
        ("height", "pat_height"),
    ]);

    let result = study.castorize_upload(input, &links, None, None, &CastorizeOptions::default());
    let Err(CastorError::NonViableData(errors)) = result else {
        panic!("expected non-viable data");
    };
    assert_eq!(errors.len(), 3);
    assert_eq!(errors[0].row, 0);
    assert_eq!(errors[0].field_name, "pat_height");
    assert_eq!(errors[0].value, "tall");
    assert_eq!(errors[0].record_id.as_deref(), Some("110001"));
    assert_eq!(errors[1].field_name, "pat_sex");
    assert_eq!(errors[2].field_name, "record_id");
    assert!(errors[2].record_id.is_none());

    assert!(source.recorded_uploads().is_empty());
}

#[tokio::test]
async fn test_value_data_mode_takes_codes() {
    let source = Arc::new(MemorySource::sample());
    let study = structured(source.clone()).await;

    let options = CastorizeOptions {
        label_data: false,
        ..CastorizeOptions::default()
    };
    let input = table(&["id", "sex"], &[&["110001", "2"], &["110002", "Female"]]);
    let links = links(&[("id", "record_id"), ("sex", "pat_sex")]);

    let result = study.castorize_upload(input, &links, None, None, &options);
    let Err(CastorError::NonViableData(errors)) = result else {
        panic!("expected the label to be rejected");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].row, 1);
}

#[tokio::test]
async fn test_translation_and_merge_from_files() {
    let dir = TempDir::new().unwrap();
    let write = |name: &str, content: &str| {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    };
    let data = write(
        "data.csv",
        "patient;geslacht;diabetes;jicht\n110001;M;ja;ja\n110002;V;nee;nee\n",
    );
    let link = write(
        "link.csv",
        "other;castor\npatient;record_id\ngeslacht;pat_sex\n",
    );
    let translation = write(
        "translation.csv",
        "variable;other;castor\ngeslacht;M;Male\ngeslacht;V;Female\n",
    );
    let merge = write(
        "merge.csv",
        "other_variable;other_value;castor_variable;castor_value\n\
         diabetes;ja;his_family;Diabetes\n\
         jicht;ja;his_family;Other\n",
    );

    let source_table = read_table(&data, b';').unwrap();
    let links: Vec<ColumnLink> = read_records(&link, b';').unwrap();
    let translation: Vec<TranslationRow> = read_records(&translation, b';').unwrap();
    let merge: Vec<MergeRow> = read_records(&merge, b';').unwrap();

    let source = Arc::new(MemorySource::sample());
    let study = structured(source.clone()).await;
    let castorized = study
        .castorize_upload(
            source_table,
            &links,
            Some(&translation),
            Some(&merge),
            &CastorizeOptions::default(),
        )
        .unwrap();
    assert!(castorized.column("his_family").is_some());

    study
        .upload(&castorized, &upload_options(false))
        .await
        .unwrap();
    let uploads = source.recorded_uploads();
    assert_eq!(uploads.len(), 2);

    let first = values_by_field(&uploads[0].values);
    assert_eq!(first["F1"], "1");
    assert_eq!(first["F3"], "1;5");
    assert!(!first.contains_key("F4"));

    let second = values_by_field(&uploads[1].values);
    assert_eq!(second["F1"], "2");
    assert!(!second.contains_key("F3"));
}

#[tokio::test]
async fn test_upload_report_creates_instance_per_row() {
    let source = Arc::new(MemorySource::sample());
    let study = structured(source.clone()).await;

    let input = table(
        &["patient", "event", "when"],
        &[
            &["110001", "Headache", "15-01-2024"],
            &["110001", "Nausea", "20-01-2024"],
        ],
    );
    let links = links(&[
        ("patient", "record_id"),
        ("event", "ae_description"),
        ("when", "ae_date"),
    ]);
    let castorized = study
        .castorize_upload(input, &links, None, None, &CastorizeOptions::default())
        .unwrap();

    let summary = study
        .upload(&castorized, &upload_options(false))
        .await
        .unwrap();
    assert!(summary.is_successful());
    assert_eq!(summary.values_succeeded, 4);
    assert!(summary.feedback.iter().all(|f| f.instance_id.is_some()));

    let instances = source.recorded_instances();
    assert_eq!(
        instances,
        vec![
            (
                "110001".to_string(),
                "FC2".to_string(),
                "Adverse Event - row 1".to_string()
            ),
            (
                "110001".to_string(),
                "FC2".to_string(),
                "Adverse Event - row 2".to_string()
            ),
        ]
    );

    let uploads = source.recorded_uploads();
    assert_eq!(uploads.len(), 2);
    for upload in &uploads {
        assert!(matches!(upload.target, UploadTarget::ReportInstance(_)));
    }
}

#[tokio::test]
async fn test_mixed_forms_cannot_be_uploaded() {
    let source = Arc::new(MemorySource::sample());
    let study = structured(source.clone()).await;

    let input = table(&["id", "sex", "event"], &[&["110001", "Male", "Headache"]]);
    let links = links(&[
        ("id", "record_id"),
        ("sex", "pat_sex"),
        ("event", "ae_description"),
    ]);
    let castorized = study
        .castorize_upload(input, &links, None, None, &CastorizeOptions::default())
        .unwrap();

    let result = study.upload(&castorized, &upload_options(false)).await;
    assert!(matches!(result, Err(CastorError::Import(_))));
    assert!(source.recorded_uploads().is_empty());
}

#[tokio::test]
async fn test_survey_fields_cannot_be_uploaded() {
    let source = Arc::new(MemorySource::sample());
    let study = structured(source.clone()).await;

    let input = table(&["id", "score"], &[&["110001", "7"]]);
    let links = links(&[("id", "record_id"), ("score", "qol_score")]);
    let castorized = study
        .castorize_upload(input, &links, None, None, &CastorizeOptions::default())
        .unwrap();

    let result = study.upload(&castorized, &upload_options(false)).await;
    assert!(matches!(result, Err(CastorError::Import(_))));
}

#[tokio::test]
async fn test_dry_run_makes_no_calls() {
    let source = Arc::new(MemorySource::sample());
    let study = structured(source.clone()).await;

    let castorized = study
        .castorize_upload(
            baseline_source(),
            &baseline_links(),
            None,
            None,
            &CastorizeOptions::default(),
        )
        .unwrap();
    let summary = study.upload(&castorized, &upload_options(true)).await.unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.values_succeeded, 6);
    assert!(source.recorded_uploads().is_empty());
    assert!(source.recorded_instances().is_empty());
}

#[tokio::test]
async fn test_failed_record_does_not_stop_others() {
    let source = Arc::new(MemorySource::sample().with_failing_record("110002"));
    let study = structured(source.clone()).await;

    let castorized = study
        .castorize_upload(
            baseline_source(),
            &baseline_links(),
            None,
            None,
            &CastorizeOptions::default(),
        )
        .unwrap();
    let summary = study.upload(&castorized, &upload_options(false)).await.unwrap();

    assert!(!summary.is_successful());
    assert_eq!(summary.rows_failed(), 1);
    assert_eq!(summary.values_succeeded, 4);
    let failed = &summary.feedback[1];
    assert_eq!(failed.record_id, "110002");
    assert!(failed.error.as_deref().unwrap().contains("110002"));
    assert_eq!(source.recorded_uploads().len(), 1);
}

#[tokio::test]
async fn test_unknown_variable_in_link_file() {
    let source = Arc::new(MemorySource::sample());
    let study = structured(source).await;

    let input = table(&["id", "weight"], &[&["110001", "80"]]);
    let links = links(&[("id", "record_id"), ("weight", "pat_weight")]);

    let result = study.castorize_upload(input, &links, None, None, &CastorizeOptions::default());
    assert!(matches!(result, Err(CastorError::Import(_))));
}
