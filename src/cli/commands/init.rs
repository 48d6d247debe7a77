//! Init command implementation
//!
//! Writes a sample `castor.toml`.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "castor.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(()) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Set study_id in {}", self.output);
                println!("  2. Create a .env file with CASTOR_CLIENT_ID and CASTOR_CLIENT_SECRET");
                println!("  3. Validate configuration: castor-edc validate-config");
                println!("  4. Run export: castor-edc export");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    fn generate_minimal_config() -> String {
        r#"# castor-edc configuration

environment = "development"

[application]
log_level = "info"
dry_run = false

[castor]
base_url = "https://data.castoredc.com"
study_id = "YOUR-STUDY-ID"
client_id = "${CASTOR_CLIENT_ID}"
client_secret = "${CASTOR_CLIENT_SECRET}"

[export]
output_dir = "output"
delimiter = ";"

[import]
label_data = true
max_concurrency = 8

[logging]
local_enabled = true
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    fn generate_config_with_examples() -> String {
        r#"# castor-edc configuration
#
# Values of the form ${VAR} are read from the environment (or a .env file).
# Every setting can also be overridden with a CASTOR_* environment variable,
# e.g. CASTOR_STUDY_ID or CASTOR_EXPORT_OUTPUT_DIR.

# development | staging | production
# TLS verification cannot be disabled in production.
environment = "development"

[application]
# trace, debug, info, warn, error
log_level = "info"

# Castorize and report, but never upload
dry_run = false

[castor]
# Region server: data.castoredc.com, uk.castoredc.com, us.castoredc.com
base_url = "https://data.castoredc.com"

study_id = "YOUR-STUDY-ID"

# OAuth client credentials from your Castor account settings
client_id = "${CASTOR_CLIENT_ID}"
client_secret = "${CASTOR_CLIENT_SECRET}"

# Request timeout in seconds
timeout_seconds = 60

# Items per page for paginated endpoints (1-5000)
page_size = 1000

tls_verify = true

[export]
# One CSV per table: study.csv, survey_<name>.csv, report_<name>.csv
output_dir = "output"

# Single-character field delimiter, also used to read import files
delimiter = ";"

# Include data of archived report instances
include_archived_reports = false

[import]
# true: optiongroup cells hold labels ("Male")
# false: optiongroup cells hold wire codes ("0")
label_data = true

# Concurrent upload requests (1-100)
max_concurrency = 8

# Change reason recorded with every uploaded value
change_reason = "Imported with castor-edc"

# chrono formats of date, datetime and time cells in import files
date_format = "%d-%m-%Y"
datetime_format = "%d-%m-%Y %H:%M"
time_format = "%H:%M"

[logging]
# JSON log files next to console output
local_enabled = true
local_path = "./logs"

# daily, hourly or never
local_rotation = "daily"
"#
        .to_string()
    }
}
