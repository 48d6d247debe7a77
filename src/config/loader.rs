//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::CastorEdcConfig;
use super::secret::secret_string;
use crate::domain::errors::CastorError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Substitutes `${VAR}` references from the environment
/// 3. Parses the TOML into [`CastorEdcConfig`]
/// 4. Applies `CASTOR_*` environment overrides
/// 5. Validates the result
///
/// # Errors
///
/// Returns a configuration error if the file is missing or unreadable, if a
/// referenced environment variable is unset, or if parsing or validation fails.
///
/// # Examples
///
/// ```no_run
/// use castor_edc::config::loader::load_config;
///
/// let config = load_config("castor.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<CastorEdcConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CastorError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CastorError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: CastorEdcConfig = toml::from_str(&contents)
        .map_err(|e| CastorError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        CastorError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| CastorError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(CastorError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies `CASTOR_<SECTION>_<KEY>` environment overrides
///
/// Unparseable numeric and boolean overrides are ignored.
fn apply_env_overrides(config: &mut CastorEdcConfig) {
    let var = |name: &str| std::env::var(name).ok();

    // Application
    if let Some(val) = var("CASTOR_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(Ok(dry_run)) = var("CASTOR_APPLICATION_DRY_RUN").map(|v| v.parse()) {
        config.application.dry_run = dry_run;
    }

    // Castor
    if let Some(val) = var("CASTOR_BASE_URL") {
        config.castor.base_url = val;
    }
    if let Some(val) = var("CASTOR_STUDY_ID") {
        config.castor.study_id = val;
    }
    if let Some(val) = var("CASTOR_CLIENT_ID") {
        config.castor.client_id = val;
    }
    if let Some(val) = var("CASTOR_CLIENT_SECRET") {
        config.castor.client_secret = secret_string(val);
    }
    if let Some(Ok(timeout)) = var("CASTOR_TIMEOUT_SECONDS").map(|v| v.parse()) {
        config.castor.timeout_seconds = timeout;
    }
    if let Some(Ok(page_size)) = var("CASTOR_PAGE_SIZE").map(|v| v.parse()) {
        config.castor.page_size = page_size;
    }
    if let Some(Ok(tls_verify)) = var("CASTOR_TLS_VERIFY").map(|v| v.parse()) {
        config.castor.tls_verify = tls_verify;
    }

    // Export
    if let Some(val) = var("CASTOR_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }
    if let Some(val) = var("CASTOR_EXPORT_DELIMITER") {
        config.export.delimiter = val;
    }

    // Import
    if let Some(Ok(label_data)) = var("CASTOR_IMPORT_LABEL_DATA").map(|v| v.parse()) {
        config.import.label_data = label_data;
    }
    if let Some(Ok(concurrency)) = var("CASTOR_IMPORT_MAX_CONCURRENCY").map(|v| v.parse()) {
        config.import.max_concurrency = concurrency;
    }
    if let Some(val) = var("CASTOR_IMPORT_CHANGE_REASON") {
        config.import.change_reason = val;
    }

    // Logging
    if let Some(Ok(enabled)) = var("CASTOR_LOGGING_LOCAL_ENABLED").map(|v| v.parse()) {
        config.logging.local_enabled = enabled;
    }
    if let Some(val) = var("CASTOR_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
