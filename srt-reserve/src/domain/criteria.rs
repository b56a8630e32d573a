//! Search criteria for a reservation run.

use std::ops::Range;

use super::{DepartureDate, DepartureHour, Station, StationRole, ValidationError};

/// The rows of the result table that the poll loop inspects.
///
/// Rows are numbered from 1, matching the table's `nth-child` indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowWindow {
    start: usize,
    count: usize,
}

impl RowWindow {
    /// Default first row to check.
    pub const DEFAULT_START: usize = 1;

    /// Default number of rows to check.
    pub const DEFAULT_COUNT: usize = 2;

    /// Last row a result page can hold.
    pub const MAX_ROW: usize = 100;

    /// Create a window of `count` rows beginning at `start`.
    ///
    /// The window must end at or before [`MAX_ROW`](Self::MAX_ROW).
    pub fn new(start: usize, count: usize) -> Result<Self, ValidationError> {
        if start == 0 {
            return Err(ValidationError::InvalidRowWindow(
                "start row is 1-based and must be at least 1",
            ));
        }
        if count == 0 {
            return Err(ValidationError::InvalidRowWindow(
                "count must be at least 1",
            ));
        }
        match start.checked_add(count - 1) {
            Some(last) if last <= Self::MAX_ROW => Ok(Self { start, count }),
            _ => Err(ValidationError::InvalidRowWindow(
                "window must end at or before row 100",
            )),
        }
    }

    /// Row indices in inspection order.
    pub fn rows(&self) -> Range<usize> {
        self.start..self.start + self.count
    }
}

impl Default for RowWindow {
    fn default() -> Self {
        Self {
            start: Self::DEFAULT_START,
            count: Self::DEFAULT_COUNT,
        }
    }
}

/// What to search for and which results may be booked.
///
/// Built once from user input and never mutated. Construction performs all
/// input validation, so holding a `SearchCriteria` means the browser can be
/// started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub departure: Station,
    pub arrival: Station,
    pub date: DepartureDate,
    pub hour: DepartureHour,
    pub window: RowWindow,
    /// Join the wait-list when a row has no seat but accepts reservations.
    pub waitlist: bool,
}

impl SearchCriteria {
    /// Validate raw input and build the criteria.
    ///
    /// Checks run in order: departure station, arrival station, date format,
    /// calendar date, hour. The first failure is returned.
    pub fn new(
        departure: &str,
        arrival: &str,
        date: &str,
        hour: &str,
        window: RowWindow,
        waitlist: bool,
    ) -> Result<Self, ValidationError> {
        let departure = Station::parse(departure, StationRole::Departure)?;
        let arrival = Station::parse(arrival, StationRole::Arrival)?;
        let date = DepartureDate::parse(date)?;
        let hour = DepartureHour::parse(hour)?;

        Ok(Self {
            departure,
            arrival,
            date,
            hour,
            window,
            waitlist,
        })
    }
}
