//! CLI interface and argument parsing

pub mod commands;

use clap::{Parser, Subcommand};

/// castor-edc - Castor EDC export and import tool
#[derive(Parser, Debug)]
#[command(name = "castor-edc")]
#[command(version, about, long_about = None)]
#[command(author = "Castor EDC Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "castor.toml", env = "CASTOR_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CASTOR_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export study data to one CSV file per form type table
    Export(commands::export::ExportArgs),

    /// Castorize a spreadsheet and upload it to the study
    Import(commands::import::ImportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
