//! Loop state and outcome of a reservation run.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// State carried from one poll pass to the next.
///
/// Owned by the poll loop alone. `booked` only ever goes from `false` to
/// `true`; the counters only grow.
#[derive(Debug, Clone)]
pub struct LoopState {
    booked: bool,
    refreshes: u64,
    attempts: u64,
    started: Instant,
}

impl LoopState {
    pub fn new() -> Self {
        Self {
            booked: false,
            refreshes: 0,
            attempts: 0,
            started: Instant::now(),
        }
    }

    /// Successful search re-submissions so far.
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Inspection passes started so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub(crate) fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    pub(crate) fn record_refresh(&mut self) {
        self.refreshes += 1;
    }

    /// Mark the run as booked. Returns `true` only for the first call.
    pub(crate) fn mark_booked(&mut self) -> bool {
        !std::mem::replace(&mut self.booked, true)
    }
}

impl Default for LoopState {
    fn default() -> Self {
        Self::new()
    }
}

/// How a reservation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// A seat was reserved from the given row
    Booked { row: usize, refreshes: u64 },
    /// The run joined the wait-list of the given row
    Waitlisted { row: usize, refreshes: u64 },
    /// Cancelled before anything was reserved
    Aborted { refreshes: u64 },
    /// The attempt or time ceiling was reached
    Exhausted { attempts: u64, refreshes: u64 },
}

impl ReservationOutcome {
    /// Whether the run secured a seat or a wait-list place.
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            ReservationOutcome::Booked { .. } | ReservationOutcome::Waitlisted { .. }
        )
    }

    pub fn refreshes(&self) -> u64 {
        match *self {
            ReservationOutcome::Booked { refreshes, .. }
            | ReservationOutcome::Waitlisted { refreshes, .. }
            | ReservationOutcome::Aborted { refreshes }
            | ReservationOutcome::Exhausted { refreshes, .. } => refreshes,
        }
    }
}

impl fmt::Display for ReservationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationOutcome::Booked { row, refreshes } => {
                write!(f, "booked train #{row} after {refreshes} refreshes")
            }
            ReservationOutcome::Waitlisted { row, refreshes } => {
                write!(f, "wait-listed on train #{row} after {refreshes} refreshes")
            }
            ReservationOutcome::Aborted { refreshes } => {
                write!(f, "aborted after {refreshes} refreshes")
            }
            ReservationOutcome::Exhausted {
                attempts,
                refreshes,
            } => write!(
                f,
                "gave up after {attempts} attempts and {refreshes} refreshes"
            ),
        }
    }
}
