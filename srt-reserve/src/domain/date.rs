//! Departure date and hour as accepted by the search form.

use std::fmt;

use chrono::NaiveDate;

use super::ValidationError;

/// A calendar departure date.
///
/// Parsed from the `YYYYMMDD` form the search page uses as the value of
/// its date options.
///
/// # Examples
///
/// ```
/// use srt_reserve::domain::DepartureDate;
///
/// let date = DepartureDate::parse("20230101").unwrap();
/// assert_eq!(date.to_option_value(), "20230101");
///
/// assert!(DepartureDate::parse("2023-01-01").is_err());
/// assert!(DepartureDate::parse("20231332").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepartureDate(NaiveDate);

impl DepartureDate {
    /// Parse a `YYYYMMDD` string.
    ///
    /// Non-digit input is a format error; digits that do not name a real
    /// day (wrong length, month 13, February 30th) are a date error.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidDateFormat(s.to_string()));
        }

        let invalid = || ValidationError::InvalidDate(s.to_string());

        if s.len() != 8 {
            return Err(invalid());
        }

        // All bytes are ASCII digits, so these slices and parses cannot fail
        let year: i32 = s[0..4].parse().map_err(|_| invalid())?;
        let month: u32 = s[4..6].parse().map_err(|_| invalid())?;
        let day: u32 = s[6..8].parse().map_err(|_| invalid())?;

        NaiveDate::from_ymd_opt(year, month, day)
            .map(DepartureDate)
            .ok_or_else(invalid)
    }

    /// The value attribute of the matching `<option>` in the date select.
    pub fn to_option_value(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }
}

impl fmt::Debug for DepartureDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DepartureDate({})", self.0)
    }
}

impl fmt::Display for DepartureDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// A departure hour from the search form's hour select.
///
/// The site only offers even hours, shown as two digits (`00`, `02`, ... `22`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepartureHour(u8);

impl DepartureHour {
    /// Parse a two-digit even hour.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidTimeFormat(s.to_string());

        let bytes = s.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }

        let hour = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
        if hour > 22 || hour % 2 != 0 {
            return Err(invalid());
        }

        Ok(DepartureHour(hour))
    }

    /// The visible text of the matching `<option>` in the hour select.
    pub fn to_option_text(&self) -> String {
        format!("{:02}", self.0)
    }
}

impl fmt::Debug for DepartureHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DepartureHour({:02})", self.0)
    }
}

impl fmt::Display for DepartureHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}
