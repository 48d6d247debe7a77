//! Configuration schema types
//!
//! Maps one-to-one onto the sections of `castor.toml`.

use crate::config::secret::{SecretString, SecretValue};
use crate::domain::StudyId;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastorEdcConfig {
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// Castor server and study
    pub castor: CastorConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CastorEdcConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid setting
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.castor.validate(&self.environment)?;
        self.export.validate()?;
        self.import.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Castorize and report, but upload nothing
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Castor server connection and study selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastorConfig {
    /// Server root, e.g. `https://data.castoredc.com`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    pub study_id: String,

    pub client_id: String,

    /// OAuth client secret; zeroized on drop
    pub client_secret: SecretString,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Items per page for HAL collections
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// TLS certificate verification
    ///
    /// Cannot be disabled when `environment = "production"`.
    #[serde(default = "default_true")]
    pub tls_verify: bool,
}

impl CastorConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("castor.base_url cannot be empty".to_string());
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| format!("castor.base_url is not a valid URL: {e}"))?;

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("castor.base_url must start with http:// or https://".to_string());
        }

        StudyId::new(self.study_id.as_str()).map_err(|e| format!("castor.study_id: {e}"))?;

        if self.client_id.trim().is_empty() {
            return Err("castor.client_id cannot be empty".to_string());
        }

        let secret = self.client_secret.expose_secret();
        if secret.is_empty() || secret.is_placeholder() {
            return Err(
                "castor.client_secret is empty or references an unset environment variable"
                    .to_string(),
            );
        }

        if self.timeout_seconds == 0 {
            return Err("castor.timeout_seconds must be > 0".to_string());
        }

        if !(1..=5000).contains(&self.page_size) {
            return Err(format!(
                "castor.page_size must be between 1 and 5000, got {}",
                self.page_size
            ));
        }

        if *environment == Environment::Production && !self.tls_verify {
            return Err(
                "TLS certificate verification cannot be disabled in production environments. \
                Set 'tls_verify = true', or use environment = \"development\" or \"staging\"."
                    .to_string(),
            );
        }

        Ok(())
    }
}

impl Default for CastorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            study_id: String::new(),
            client_id: String::new(),
            client_secret: Secret::new(SecretValue::default()),
            timeout_seconds: default_timeout_seconds(),
            page_size: default_page_size(),
            tls_verify: true,
        }
    }
}

/// Tabular export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory receiving one CSV file per table
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Single-character CSV delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Also export archived report instances
    #[serde(default)]
    pub include_archived_reports: bool,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_dir.trim().is_empty() {
            return Err("export.output_dir cannot be empty".to_string());
        }
        self.delimiter_byte()?;
        Ok(())
    }

    /// Delimiter as a single byte
    ///
    /// # Errors
    ///
    /// Fails unless the delimiter is exactly one ASCII character.
    pub fn delimiter_byte(&self) -> Result<u8, String> {
        match self.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!(
                "export.delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            )),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            delimiter: default_delimiter(),
            include_archived_reports: false,
        }
    }
}

/// Import settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Source optiongroup cells hold labels (`true`) or wire codes (`false`)
    #[serde(default = "default_true")]
    pub label_data: bool,

    /// Maximum concurrent record uploads
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Change reason recorded with every uploaded value
    #[serde(default = "default_change_reason")]
    pub change_reason: String,

    /// chrono format of source dates
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// chrono format of source datetimes
    #[serde(default = "default_datetime_format")]
    pub datetime_format: String,

    /// chrono format of source times
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

impl ImportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 || self.max_concurrency > 100 {
            return Err(format!(
                "import.max_concurrency must be between 1 and 100, got {}",
                self.max_concurrency
            ));
        }

        if self.change_reason.trim().is_empty() {
            return Err("import.change_reason cannot be empty".to_string());
        }

        for (name, format) in [
            ("date_format", &self.date_format),
            ("datetime_format", &self.datetime_format),
            ("time_format", &self.time_format),
        ] {
            if !format.contains('%') {
                return Err(format!(
                    "import.{name} '{format}' contains no format specifiers"
                ));
            }
        }

        Ok(())
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            label_data: true,
            max_concurrency: default_max_concurrency(),
            change_reason: default_change_reason(),
            date_format: default_date_format(),
            datetime_format: default_datetime_format(),
            time_format: default_time_format(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to a rolling file
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Rotation (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://data.castoredc.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_page_size() -> usize {
    1000
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_delimiter() -> String {
    ";".to_string()
}

fn default_max_concurrency() -> usize {
    8
}

fn default_change_reason() -> String {
    "Imported with castor-edc".to_string()
}

fn default_date_format() -> String {
    "%d-%m-%Y".to_string()
}

fn default_datetime_format() -> String {
    "%d-%m-%Y %H:%M".to_string()
}

fn default_time_format() -> String {
    "%H:%M".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
