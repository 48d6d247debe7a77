//! Result type alias for castor-edc

use super::errors::CastorError;

/// Result type alias for castor-edc operations
///
/// # Examples
///
/// ```
/// use castor_edc::domain::result::Result;
/// use castor_edc::domain::errors::CastorError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(CastorError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, CastorError>;
