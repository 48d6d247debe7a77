//! Configuration management for castor-edc.
//!
//! TOML-based configuration loading, parsing and validation.
//!
//! # Overview
//!
//! castor-edc reads a `castor.toml` file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `CASTOR_*` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use castor_edc::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("castor.toml")?;
//!
//! println!("Castor server: {}", config.castor.base_url);
//! println!("Study: {}", config.castor.study_id);
//! println!("Output directory: {}", config.export.output_dir);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry-run switch
//! - [`CastorConfig`] - Server, study and OAuth credentials
//! - [`ExportConfig`] - Output directory and CSV delimiter
//! - [`ImportConfig`] - Castorization input mode, formats and upload concurrency
//! - [`LoggingConfig`] - Rolling file logs
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//!
//! [application]
//! log_level = "info"
//!
//! [castor]
//! base_url = "https://data.castoredc.com"
//! study_id = "D234215B-D956-482D-BF17-71F2BB12A2FD"
//! client_id = "${CASTOR_CLIENT_ID}"
//! client_secret = "${CASTOR_CLIENT_SECRET}"
//!
//! [export]
//! output_dir = "output"
//! delimiter = ";"
//!
//! [import]
//! label_data = true
//! max_concurrency = 8
//! date_format = "%d-%m-%Y"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, CastorConfig, CastorEdcConfig, Environment, ExportConfig, ImportConfig,
    LoggingConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
