//! Missing-data taxonomy
//!
//! Castor stores deliberately missing values as a raw string such as
//! `"Missing (not done)"`. Each of the five reasons maps to a fixed numeric code
//! and to a far-future placeholder date. An empty raw value is *not* missing data;
//! it means the field was never filled in.

use chrono::NaiveDate;
use std::fmt;

/// Substring marking a raw value as a missing-data code
pub const MISSING_MARKER: &str = "Missing";

/// One of the five platform-standard reasons a value is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MissingReason {
    MeasurementFailed,
    NotApplicable,
    NotAsked,
    AskedButUnknown,
    NotDone,
}

impl MissingReason {
    /// All reasons in code order (-95 through -99)
    pub const ALL: [MissingReason; 5] = [
        MissingReason::MeasurementFailed,
        MissingReason::NotApplicable,
        MissingReason::NotAsked,
        MissingReason::AskedButUnknown,
        MissingReason::NotDone,
    ];

    /// Reason text as it appears inside the raw value
    pub fn label(&self) -> &'static str {
        match self {
            MissingReason::MeasurementFailed => "measurement failed",
            MissingReason::NotApplicable => "not applicable",
            MissingReason::NotAsked => "not asked",
            MissingReason::AskedButUnknown => "asked but unknown",
            MissingReason::NotDone => "not done",
        }
    }

    /// Numeric sentinel code, -95 through -99
    pub fn code(&self) -> i32 {
        match self {
            MissingReason::MeasurementFailed => -95,
            MissingReason::NotApplicable => -96,
            MissingReason::NotAsked => -97,
            MissingReason::AskedButUnknown => -98,
            MissingReason::NotDone => -99,
        }
    }

    /// Placeholder year used for date-family fields, 2995 through 2999
    pub fn placeholder_year(&self) -> i32 {
        2900 - self.code()
    }

    /// Placeholder date `01-01-YYYY` used for date-family fields
    pub fn placeholder_date(&self) -> NaiveDate {
        // January 1st exists in every year, so this is always Some
        NaiveDate::from_ymd_opt(self.placeholder_year(), 1, 1).unwrap_or_default()
    }

    /// Finds the reason whose label equals `label`
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|reason| reason.label() == label)
    }

    /// Finds the reason with the given numeric code
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|reason| reason.code() == code)
    }
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification of a non-empty raw value against the taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingCheck {
    /// The value is not a missing-data code
    Present,
    /// The value carries the marker and exactly this reason
    Missing(MissingReason),
    /// The value carries the marker but none of the five reasons
    Unrecognized,
}

/// Tests a raw value for the missing-data marker and resolves its reason
///
/// No reason label is a substring of another, so search order does not matter.
pub fn classify(raw: &str) -> MissingCheck {
    if !raw.contains(MISSING_MARKER) {
        return MissingCheck::Present;
    }
    MissingReason::ALL
        .into_iter()
        .find(|reason| raw.contains(reason.label()))
        .map(MissingCheck::Missing)
        .unwrap_or(MissingCheck::Unrecognized)
}
