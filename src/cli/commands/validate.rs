//! Validate config command implementation

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        // load_config validates as well; a failure here covers both
        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                println!("Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Castor Server: {}", config.castor.base_url);
        println!("  Study: {}", config.castor.study_id);
        println!("  Client: {}", config.castor.client_id);
        println!("  Page Size: {}", config.castor.page_size);
        println!("  Export Directory: {}", config.export.output_dir);
        println!("  Delimiter: {:?}", config.export.delimiter);
        println!(
            "  Import Mode: {}",
            if config.import.label_data {
                "labels"
            } else {
                "values"
            }
        );
        println!("  Upload Concurrency: {}", config.import.max_concurrency);
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_validate_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[castor]
study_id = "D234215B-D956-482D-BF17-71F2BB12A2FD"
client_id = "client"
client_secret = "not-a-real-secret"
"#
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_validate_missing_file() {
        let code = ValidateArgs {}.execute("/nonexistent/castor.toml").await.unwrap();
        assert_eq!(code, 2);
    }
}
