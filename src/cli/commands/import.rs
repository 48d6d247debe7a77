//! Import command implementation
//!
//! Reads a source table and its link files, castorizes the data against the
//! study structure, and uploads it unless any cell failed.

use super::exit_code_for;
use crate::adapters::castor::CastorClient;
use crate::adapters::spreadsheet::{read_records, read_table};
use crate::config::load_config;
use crate::core::import::{
    CastorizeOptions, ColumnLink, MergeRow, TranslationRow, UploadOptions,
};
use crate::core::session::CastorStudy;
use crate::domain::{CastorError, CellErrorReport};
use crate::log_error_with_context;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Cell errors printed before the rest are summarized
const MAX_PRINTED_CELL_ERRORS: usize = 25;

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Source data file
    pub source: PathBuf,

    /// Column link file (`other`, `castor`); must map a column to `record_id`
    #[arg(long)]
    pub link: PathBuf,

    /// Value translation file (`variable`, `other`, `castor`)
    #[arg(long)]
    pub translation: Option<PathBuf>,

    /// Column merge file (`other_variable`, `other_value`, `castor_variable`, `castor_value`)
    #[arg(long)]
    pub merge: Option<PathBuf>,

    /// Optiongroup cells hold wire codes instead of labels
    #[arg(long)]
    pub value_data: bool,

    /// Castorize and report without uploading
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl ImportArgs {
    /// Execute the import command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(source = %self.source.display(), "Starting import command");

        let mut config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };
        if self.value_data {
            config.import.label_data = false;
        }
        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }
        let delimiter = match config.export.delimiter_byte() {
            Ok(delimiter) => delimiter,
            Err(e) => {
                eprintln!("Invalid delimiter: {e}");
                return Ok(2);
            }
        };
        let dry_run = self.dry_run || config.application.dry_run;

        let inputs = read_table(&self.source, delimiter).and_then(|source| {
            let links: Vec<ColumnLink> = read_records(&self.link, delimiter)?;
            let translation: Option<Vec<TranslationRow>> = self
                .translation
                .as_deref()
                .map(|path| read_records(path, delimiter))
                .transpose()?;
            let merge: Option<Vec<MergeRow>> = self
                .merge
                .as_deref()
                .map(|path| read_records(path, delimiter))
                .transpose()?;
            Ok((source, links, translation, merge))
        });
        let (source, links, translation, merge) = match inputs {
            Ok(inputs) => inputs,
            Err(e) => {
                log_error_with_context!(&e, "Reading import files failed");
                eprintln!("Failed to read import files: {e}");
                return Ok(2);
            }
        };

        let client = match CastorClient::connect(config.castor.clone()).await {
            Ok(client) => client,
            Err(e) => {
                log_error_with_context!(&e, "Failed to connect to Castor");
                eprintln!("Failed to connect to Castor: {e}");
                return Ok(4);
            }
        };
        let mut study = CastorStudy::new(Arc::new(client));
        if let Err(e) = study.map_structure().await {
            log_error_with_context!(&e, "Mapping study structure failed");
            eprintln!("Mapping study structure failed: {e}");
            return Ok(exit_code_for(&e));
        }

        let rows = source.len();
        let options = CastorizeOptions::from(&config.import);
        let table = match study.castorize_upload(
            source,
            &links,
            translation.as_deref(),
            merge.as_deref(),
            &options,
        ) {
            Ok(table) => table,
            Err(CastorError::NonViableData(errors)) => {
                print_cell_errors(&errors);
                return Ok(5);
            }
            Err(e) => {
                log_error_with_context!(&e, "Castorization failed");
                eprintln!("Castorization failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };
        println!(
            "Castorized {} rows into {} Castor fields",
            rows,
            table.columns.len()
        );

        if !self.yes && !dry_run {
            print!("Upload to study {}? [y/N]: ", study.study_id());
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Import cancelled.");
                return Ok(0);
            }
        }

        let upload_options = UploadOptions::from_config(&config.import, dry_run);
        let summary = match study.upload(&table, &upload_options).await {
            Ok(summary) => summary,
            Err(e) => {
                log_error_with_context!(&e, "Upload failed");
                eprintln!("Upload failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };
        summary.log_summary();

        println!();
        println!("Import Summary{}:", if dry_run { " (dry run)" } else { "" });
        println!("  Rows: {}", summary.rows_total);
        println!("  Rows skipped (no values): {}", summary.rows_skipped);
        println!("  Rows failed: {}", summary.rows_failed());
        println!("  Values stored: {}", summary.values_succeeded);
        println!("  Values rejected: {}", summary.values_failed);
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        for feedback in summary.feedback.iter().filter(|f| !f.is_successful()) {
            if let Some(error) = &feedback.error {
                println!("  - row {} ({}): {error}", feedback.row + 1, feedback.record_id);
            }
            for failed in &feedback.failed {
                println!(
                    "  - row {} ({}), field {}: {}",
                    feedback.row + 1,
                    feedback.record_id,
                    failed.field_id.as_deref().unwrap_or("?"),
                    failed.message.as_deref().unwrap_or("rejected")
                );
            }
        }
        println!();

        if summary.is_successful() {
            println!("Import completed successfully");
            Ok(0)
        } else {
            println!("Import completed with failures");
            Ok(1)
        }
    }
}

fn print_cell_errors(errors: &[CellErrorReport]) {
    tracing::error!(error_cells = errors.len(), "Import halted on non-viable data");
    eprintln!("Import halted: {} cells could not be castorized", errors.len());
    for error in errors.iter().take(MAX_PRINTED_CELL_ERRORS) {
        eprintln!("  - {error}");
    }
    if errors.len() > MAX_PRINTED_CELL_ERRORS {
        eprintln!("  ... and {} more", errors.len() - MAX_PRINTED_CELL_ERRORS);
    }
}
