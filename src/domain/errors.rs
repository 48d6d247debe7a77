//! Domain error types
//!
//! This module defines the error hierarchy for castor-edc. Errors fall into
//! four groups:
//!
//! - **Structural integrity** errors: the structure export and the data export
//!   (or the link table and the data export) disagree. Always fatal.
//! - **Unsupported field types**: the platform sent a field type this crate has
//!   no transformation for. Always fatal.
//! - **Non-viable data**: a castorized import batch contains at least one cell
//!   error. Raised once, before any upload.
//! - Transport, configuration and I/O failures.
//!
//! Per-cell value errors are *not* part of this hierarchy; they travel as
//! values (see [`crate::domain::value::FieldValue::Error`] and
//! [`crate::core::import::Castorized::Error`]).

use thiserror::Error;

/// Main castor-edc error type
#[derive(Debug, Error)]
pub enum CastorError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Castor REST API errors
    #[error("Castor API error: {0}")]
    Api(#[from] ApiError),

    /// The structure and data trees are mutually inconsistent
    #[error("Structural integrity error: {0}")]
    StructuralIntegrity(String),

    /// A field declares a type with no defined transformation
    #[error("Unsupported field type '{field_type}' on field '{field}'")]
    UnsupportedFieldType { field: String, field_type: String },

    /// An import batch contains cells that could not be castorized
    #[error("Non-viable data: {} cell(s) could not be castorized", .0.len())]
    NonViableData(Vec<CellErrorReport>),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Tabular export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Import process errors
    #[error("Import error: {0}")]
    Import(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl CastorError {
    /// Shorthand for a structural integrity error
    pub fn structural(message: impl Into<String>) -> Self {
        CastorError::StructuralIntegrity(message.into())
    }
}

/// Castor API errors
///
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failed to connect to the Castor server
    #[error("Failed to connect to Castor server: {0}")]
    ConnectionFailed(String),

    /// Token request was rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Response could not be parsed
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },
}

/// A single cell that failed castorization
///
/// Collected for every failing cell of a batch so they can be reported together.
#[derive(Debug, Clone, PartialEq)]
pub struct CellErrorReport {
    /// Zero-based row index in the source table
    pub row: usize,

    /// Record the row belongs to (if the record column resolved)
    pub record_id: Option<String>,

    /// Castor variable name of the column
    pub field_name: String,

    /// The external value that failed
    pub value: String,

    /// Why the value was rejected
    pub reason: String,
}

impl CellErrorReport {
    /// Creates a new cell error report
    pub fn new(
        row: usize,
        field_name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            row,
            record_id: None,
            field_name: field_name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Sets the record ID
    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }
}

impl std::fmt::Display for CellErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row {} ({}), {}: '{}' - {}",
            self.row,
            self.record_id.as_deref().unwrap_or("?"),
            self.field_name,
            self.value,
            self.reason
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for CastorError {
    fn from(err: std::io::Error) -> Self {
        CastorError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for CastorError {
    fn from(err: serde_json::Error) -> Self {
        CastorError::Serialization(err.to_string())
    }
}

// Conversion from csv::Error
impl From<csv::Error> for CastorError {
    fn from(err: csv::Error) -> Self {
        CastorError::Serialization(format!("CSV error: {err}"))
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for CastorError {
    fn from(err: toml::de::Error) -> Self {
        CastorError::Configuration(format!("TOML parse error: {err}"))
    }
}
