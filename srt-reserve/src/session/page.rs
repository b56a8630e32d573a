//! The result page as seen by the reservation poll loop.

use super::SessionError;

/// Texts read from one row of the result table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRead {
    /// Both cells were read
    Texts { seat: String, waitlist: String },
    /// The row re-rendered (or a dialog blocked the read) mid-read
    Stale,
    /// The row does not exist on the current page
    Missing,
}

impl RowRead {
    pub fn texts(seat: impl Into<String>, waitlist: impl Into<String>) -> Self {
        RowRead::Texts {
            seat: seat.into(),
            waitlist: waitlist.into(),
        }
    }
}

/// What happened when an action link was activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Clicked,
    /// Another element (usually an overlay) received the click
    Intercepted,
    /// The link was replaced before the click landed
    Stale,
    /// A dialog was open and swallowed the click
    DialogOpen,
    /// The row has no action link
    Missing,
}

/// Operations the poll loop performs on the search result page.
///
/// Expected page conditions (stale rows, intercepted clicks, no dialog) are
/// returned as values. Errors are reserved for failures the loop cannot
/// recover from locally, plus transient errors from re-submitting the
/// search, which the loop retries.
#[allow(async_fn_in_trait)]
pub trait ResultPage {
    /// Read the seat and wait-list cells of a 1-based result row.
    async fn read_row(&self, row: usize) -> Result<RowRead, SessionError>;

    /// Accept the open dialog, returning its text, or `None` if there was none.
    async fn accept_dialog(&self) -> Result<Option<String>, SessionError>;

    /// Click the standard-seat action of a row.
    async fn click_seat(&self, row: usize) -> Result<ClickOutcome, SessionError>;

    /// Activate the standard-seat action with the Enter key.
    async fn press_seat(&self, row: usize) -> Result<ClickOutcome, SessionError>;

    /// Click the wait-list action of a row.
    async fn click_waitlist(&self, row: usize) -> Result<ClickOutcome, SessionError>;

    /// Wait (bounded) for the reservation confirmation marker.
    async fn reservation_confirmed(&self) -> Result<bool, SessionError>;

    /// Return from a failed reservation attempt to the result list.
    async fn go_back(&self) -> Result<(), SessionError>;

    /// Submit the search form again and wait (bounded) for the results.
    async fn resubmit_search(&self) -> Result<(), SessionError>;
}
