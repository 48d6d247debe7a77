//! Logging and observability
//!
//! Structured logging through `tracing`, with console output and optional
//! rotated JSON log files.
//!
//! # Example
//!
//! ```no_run
//! use castor_edc::logging::init_logging;
//! use castor_edc::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(study_id = "D234215B", "Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the completion of a study mapping
///
/// # Example
///
/// ```no_run
/// use castor_edc::log_mapping_complete;
/// use std::time::Duration;
///
/// log_mapping_complete!("D234215B", 12, 3400, Duration::from_secs(4));
/// ```
#[macro_export]
macro_rules! log_mapping_complete {
    ($study_id:expr, $records:expr, $data_points:expr, $duration:expr) => {
        tracing::info!(
            study_id = %$study_id,
            records = $records,
            data_points = $data_points,
            duration_ms = $duration.as_millis(),
            "Study mapping completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use castor_edc::log_error_with_context;
/// use castor_edc::domain::CastorError;
///
/// let error = CastorError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
