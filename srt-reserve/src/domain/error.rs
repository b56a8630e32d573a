//! Input validation errors.
//!
//! Every variant is raised before a browser is started, so a bad
//! command line never costs a browser launch or a login.

use super::StationRole;

/// Rejected search input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Station name is not on the SRT network
    #[error("unknown {role} station '{name}'")]
    InvalidStationName { role: StationRole, name: String },

    /// Date contains something other than ASCII digits
    #[error("date must contain only digits, got '{0}'")]
    InvalidDateFormat(String),

    /// Digits do not form a calendar date
    #[error("invalid date '{0}': expected YYYYMMDD")]
    InvalidDate(String),

    /// Hour is not one of the site's departure-hour options
    #[error("invalid departure hour '{0}': expected an even hour from 00 to 22")]
    InvalidTimeFormat(String),

    /// Row window is empty or starts before the first row
    #[error("invalid row window: {0}")]
    InvalidRowWindow(&'static str),
}
