//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that cross the API boundary. Identifiers
//! internal to the study tree (form, step and field ids) stay plain strings and
//! are owned by the tree itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Study identifier newtype wrapper
///
/// Castor study ids are upper-case UUIDs, but any non-empty string is accepted.
///
/// # Examples
///
/// ```
/// use castor_edc::domain::ids::StudyId;
/// use std::str::FromStr;
///
/// let study_id = StudyId::from_str("D234215B-D956-482D-BF17-71F2BB12A2FD").unwrap();
/// assert_eq!(study_id.as_str(), "D234215B-D956-482D-BF17-71F2BB12A2FD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudyId(String);

impl StudyId {
    /// Creates a new StudyId from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(StudyId)` if the ID is valid, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Study ID cannot be empty".to_string());
        }
        if id.contains('/') {
            return Err(format!("Study ID cannot contain '/': {id}"));
        }
        Ok(Self(id))
    }

    /// Returns the study ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for StudyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StudyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for StudyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Record identifier newtype wrapper
///
/// Record ids are participant ids such as `110001`. Surrounding whitespace is
/// trimmed, since spreadsheet sources regularly carry it.
///
/// # Examples
///
/// ```
/// use castor_edc::domain::ids::RecordId;
///
/// let record_id = RecordId::new(" 110001 ").unwrap();
/// assert_eq!(record_id.as_str(), "110001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new RecordId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("Record ID cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the record ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_study_id_creation() {
        let id = StudyId::new("D234215B-D956-482D-BF17-71F2BB12A2FD").unwrap();
        assert_eq!(id.as_str(), "D234215B-D956-482D-BF17-71F2BB12A2FD");
    }

    #[test]
    fn test_study_id_invalid() {
        assert!(StudyId::new("").is_err());
        assert!(StudyId::new("   ").is_err());
        assert!(StudyId::new("abc/def").is_err());
    }

    #[test]
    fn test_record_id_trims_whitespace() {
        let id = RecordId::new("  110001\t").unwrap();
        assert_eq!(id.as_str(), "110001");
        assert_eq!(format!("{id}"), "110001");
    }

    #[test]
    fn test_record_id_empty_fails() {
        assert!(RecordId::new("").is_err());
        assert!(RecordId::new(" ").is_err());
    }

    #[test]
    fn test_record_id_ordering() {
        let mut ids = vec![
            RecordId::new("110002").unwrap(),
            RecordId::new("110001").unwrap(),
        ];
        ids.sort();
        assert_eq!(ids[0].as_str(), "110001");
    }

    #[test]
    fn test_study_id_serialization() {
        let id = StudyId::new("D234215B").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: StudyId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
