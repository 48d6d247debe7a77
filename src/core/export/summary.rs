//! Export summary and reporting

use super::table::ExportedTables;
use crate::domain::{ApiError, CastorError};
use std::path::PathBuf;
use std::time::Duration;

/// One written table
#[derive(Debug, Clone, PartialEq)]
pub struct TableSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    /// Cells holding the error sentinel
    pub error_cells: usize,
    pub path: Option<PathBuf>,
}

/// Summary of an export operation
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub study_id: String,

    /// Records in the study
    pub total_records: usize,

    /// Data points mapped from the data export
    pub total_data_points: usize,

    /// Duplicate data rows ignored
    pub duplicates_skipped: usize,

    pub tables: Vec<TableSummary>,

    /// Duration of the export
    pub duration: Duration,

    /// Errors encountered during export
    pub errors: Vec<ExportError>,
}

impl ExportSummary {
    pub fn new(study_id: impl Into<String>) -> Self {
        Self {
            study_id: study_id.into(),
            total_records: 0,
            total_data_points: 0,
            duplicates_skipped: 0,
            tables: Vec::new(),
            duration: Duration::from_secs(0),
            errors: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn add_error(&mut self, error: ExportError) {
        self.errors.push(error);
    }

    /// Records the tables, paired with the paths they were written to
    pub fn record_tables(&mut self, tables: &ExportedTables, paths: &[PathBuf]) {
        self.tables = tables
            .iter()
            .enumerate()
            .map(|(index, table)| TableSummary {
                name: table.name.clone(),
                rows: table.len(),
                columns: table.columns.len(),
                error_cells: table.error_count(),
                path: paths.get(index).cloned(),
            })
            .collect();
    }

    /// Total cells holding the error sentinel
    pub fn error_cells(&self) -> usize {
        self.tables.iter().map(|table| table.error_cells).sum()
    }

    /// Check if the export was successful (no failures)
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            study_id = %self.study_id,
            records = self.total_records,
            data_points = self.total_data_points,
            duplicates_skipped = self.duplicates_skipped,
            tables = self.tables.len(),
            error_cells = self.error_cells(),
            duration_secs = self.duration.as_secs(),
            "Export completed"
        );

        for table in &self.tables {
            tracing::debug!(
                table = %table.name,
                rows = table.rows,
                columns = table.columns,
                error_cells = table.error_cells,
                "Exported table"
            );
        }

        if !self.errors.is_empty() {
            tracing::warn!(error_count = self.errors.len(), "Export completed with errors");
            for error in &self.errors {
                tracing::warn!(
                    error_type = ?error.error_type,
                    message = %error.message,
                    "Export error"
                );
            }
        }
    }
}

/// Type of export error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportErrorType {
    /// Connection or server error
    Connection,
    /// Authentication error
    Authentication,
    /// Structure and data exports disagree
    Structure,
    /// A field type outside the known set
    UnsupportedType,
    /// Writing tables failed
    Output,
    /// Configuration error
    Configuration,
    /// Unknown error
    Unknown,
}

/// Export error with context
#[derive(Debug, Clone)]
pub struct ExportError {
    pub error_type: ExportErrorType,
    pub message: String,

    /// Optional context (e.g. table name)
    pub context: Option<String>,
}

impl ExportError {
    pub fn new(error_type: ExportErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            context: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }
}

impl From<&CastorError> for ExportError {
    fn from(error: &CastorError) -> Self {
        let error_type = match error {
            CastorError::Api(ApiError::AuthenticationFailed(_)) => ExportErrorType::Authentication,
            CastorError::Api(_) => ExportErrorType::Connection,
            CastorError::StructuralIntegrity(_) => ExportErrorType::Structure,
            CastorError::UnsupportedFieldType { .. } => ExportErrorType::UnsupportedType,
            CastorError::Export(_) | CastorError::Io(_) => ExportErrorType::Output,
            CastorError::Configuration(_) => ExportErrorType::Configuration,
            _ => ExportErrorType::Unknown,
        };
        ExportError::new(error_type, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::table::{Cell, Column, ColumnKind, Table};

    #[test]
    fn test_export_summary_creation() {
        let summary = ExportSummary::new("STUDY-1");

        assert_eq!(summary.study_id, "STUDY-1");
        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.duration, Duration::from_secs(0));
        assert!(summary.errors.is_empty());
        assert!(summary.is_successful());
    }

    #[test]
    fn test_export_summary_with_duration() {
        let summary = ExportSummary::new("STUDY-1").with_duration(Duration::from_secs(120));
        assert_eq!(summary.duration, Duration::from_secs(120));
    }

    #[test]
    fn test_record_tables_counts_errors() {
        let mut study = Table::new("Study", vec![Column::new("pat_age", ColumnKind::Numeric)]);
        study.push_row(vec![Cell::error()]);
        study.push_row(vec![Cell::Number(42.0)]);
        let tables = ExportedTables {
            study,
            surveys: Vec::new(),
            reports: Vec::new(),
        };

        let mut summary = ExportSummary::new("STUDY-1");
        summary.record_tables(&tables, &[PathBuf::from("out/study.csv")]);
        assert_eq!(summary.tables[0].rows, 2);
        assert_eq!(summary.error_cells(), 1);
        assert_eq!(summary.tables[0].path, Some(PathBuf::from("out/study.csv")));
    }

    #[test]
    fn test_export_error_from_castor_error() {
        let error = ExportError::from(&CastorError::structural("orphan data point"));
        assert_eq!(error.error_type, ExportErrorType::Structure);

        let error = ExportError::from(&CastorError::Api(ApiError::AuthenticationFailed(
            "401".to_string(),
        )))
        .with_context("study_id=STUDY-1".to_string());
        assert_eq!(error.error_type, ExportErrorType::Authentication);
        assert_eq!(error.context.as_deref(), Some("study_id=STUDY-1"));
    }
}
