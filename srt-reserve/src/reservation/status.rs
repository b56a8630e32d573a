//! Row availability as the poll loop sees it.

use crate::session::RowRead;

/// Seat cell text of a row that can be booked now.
pub const RESERVABLE_TEXT: &str = "예약하기";
/// Wait-list cell text of a row accepting wait-list applications.
pub const WAITLIST_OPEN_TEXT: &str = "신청하기";
/// Cell text of a full train.
pub const SOLD_OUT_TEXT: &str = "매진";

/// Availability of one result row, derived once per read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// A seat can be booked now. A row whose booking falls through may still
    /// be wait-listed.
    Reservable { waitlist_open: bool },
    /// No seat, but the wait-list accepts applications
    WaitlistOpen,
    SoldOut,
    Unknown,
}

impl RowStatus {
    /// Classify the two cell texts of a row.
    ///
    /// An open seat wins over an open wait-list.
    pub fn classify(seat: &str, waitlist: &str) -> Self {
        let waitlist_open = waitlist.contains(WAITLIST_OPEN_TEXT);
        if seat.contains(RESERVABLE_TEXT) {
            RowStatus::Reservable { waitlist_open }
        } else if waitlist_open {
            RowStatus::WaitlistOpen
        } else if seat.contains(SOLD_OUT_TEXT) {
            RowStatus::SoldOut
        } else {
            RowStatus::Unknown
        }
    }

    /// A stale read counts as sold out for this pass; a missing row is unknown.
    pub fn from_read(read: &RowRead) -> Self {
        match read {
            RowRead::Texts { seat, waitlist } => Self::classify(seat, waitlist),
            RowRead::Stale => RowStatus::SoldOut,
            RowRead::Missing => RowStatus::Unknown,
        }
    }
}
