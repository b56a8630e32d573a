//! Domain types for an SRT reservation run.
//!
//! All types enforce their invariants at construction time, so a
//! `SearchCriteria` in hand means the input has already been validated
//! and the browser may be started.

mod credentials;
mod criteria;
mod date;
mod error;
mod station;

pub use credentials::{Credentials, EmailSettings};
pub use criteria::{RowWindow, SearchCriteria};
pub use date::{DepartureDate, DepartureHour};
pub use error::ValidationError;
pub use station::{STATIONS, Station, StationRole};
