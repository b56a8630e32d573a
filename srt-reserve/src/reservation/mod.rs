//! Reservation poll loop.
//!
//! Works against any [`ResultPage`](crate::session::ResultPage): reads the
//! configured window of result rows, books the first reservable one (or joins
//! its wait-list), and re-submits the search until something is secured.

mod policy;
mod poll;
mod state;
mod status;

pub use policy::PollPolicy;
pub use poll::{BOOKED_SUBJECT, Reservation, WAITLISTED_SUBJECT};
pub use state::{LoopState, ReservationOutcome};
pub use status::{RESERVABLE_TEXT, RowStatus, SOLD_OUT_TEXT, WAITLIST_OPEN_TEXT};
