//! Export command implementation
//!
//! Maps the study's structure and data, and writes one CSV file per table.

use super::exit_code_for;
use crate::adapters::castor::CastorClient;
use crate::config::load_config;
use crate::core::export::{write_tables, ExportError, ExportSummary};
use crate::core::session::CastorStudy;
use crate::log_error_with_context;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Override the output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Include data of archived report instances
    #[arg(long)]
    pub include_archived: bool,

    /// Override the CSV delimiter
    #[arg(long)]
    pub delimiter: Option<String>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        if let Some(output_dir) = &self.output_dir {
            config.export.output_dir = output_dir.to_string_lossy().to_string();
        }
        if let Some(delimiter) = &self.delimiter {
            config.export.delimiter = delimiter.clone();
        }
        if self.include_archived {
            config.export.include_archived_reports = true;
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

        let start = Instant::now();
        let client = match CastorClient::connect(config.castor.clone()).await {
            Ok(client) => client,
            Err(e) => {
                log_error_with_context!(&e, "Failed to connect to Castor");
                eprintln!("Failed to connect to Castor: {e}");
                return Ok(4);
            }
        };

        let mut study = CastorStudy::new(Arc::new(client))
            .with_archived_reports(config.export.include_archived_reports);
        let mut summary = ExportSummary::new(study.study_id());

        println!("Mapping study {}...", study.study_id());
        let stats = match study.map_data().await {
            Ok(stats) => stats,
            Err(e) => {
                log_error_with_context!(&e, "Study mapping failed");
                summary.add_error(ExportError::from(&e));
                eprintln!("Study mapping failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };
        summary.total_records = study.study().record_count();
        summary.total_data_points = stats.data_points;
        summary.duplicates_skipped = stats.duplicates;

        let tables = match study.export_to_tables() {
            Ok(tables) => tables,
            Err(e) => {
                log_error_with_context!(&e, "Building export tables failed");
                eprintln!("Export failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let output_dir = PathBuf::from(&config.export.output_dir);
        let paths = match write_tables(&tables, &output_dir, delimiter) {
            Ok(paths) => paths,
            Err(e) => {
                log_error_with_context!(&e, "Writing export tables failed");
                summary.add_error(
                    ExportError::from(&e).with_context(output_dir.display().to_string()),
                );
                Vec::new()
            }
        };
        summary.record_tables(&tables, &paths);
        let summary = summary.with_duration(start.elapsed());
        summary.log_summary();

        println!();
        println!("Export Summary:");
        println!("  Study: {}", summary.study_id);
        println!("  Records: {}", summary.total_records);
        println!("  Data points: {}", summary.total_data_points);
        println!("  Duplicates skipped: {}", summary.duplicates_skipped);
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        for table in &summary.tables {
            let path = table
                .path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "not written".to_string());
            println!(
                "  {}: {} rows, {} columns, {} error cells -> {}",
                table.name, table.rows, table.columns, table.error_cells, path
            );
        }
        println!();

        if !summary.errors.is_empty() {
            println!("Errors encountered:");
            for error in &summary.errors {
                println!("  - {:?}: {}", error.error_type, error.message);
                if let Some(context) = &error.context {
                    println!("    Context: {context}");
                }
            }
            return Ok(1);
        }

        if summary.error_cells() > 0 {
            println!(
                "Export completed; {} values could not be interpreted and read \"Error\"",
                summary.error_cells()
            );
        } else {
            println!("Export completed successfully");
        }
        Ok(0)
    }
}
