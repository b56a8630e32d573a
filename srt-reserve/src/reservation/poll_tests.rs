//! Unit tests for the reservation poll loop.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use chromiumoxide::error::CdpError;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::browser::BrowserError;
use crate::domain::{RowWindow, SearchCriteria};
use crate::notify::{Notifier, NotifyError};
use crate::session::{ClickOutcome, ResultPage, RowRead, SessionError};

const SOLD_OUT: (&str, &str) = ("매진", "매진");
const RESERVABLE: (&str, &str) = ("예약하기", "매진");
const WAITLIST_ONLY: (&str, &str) = ("매진", "신청하기");

fn pass(rows: &[(&str, &str)]) -> Vec<RowRead> {
    rows.iter()
        .map(|(seat, waitlist)| RowRead::texts(*seat, *waitlist))
        .collect()
}

fn criteria(waitlist: bool) -> SearchCriteria {
    SearchCriteria::new(
        "수서",
        "부산",
        "20240315",
        "08",
        RowWindow::default(),
        waitlist,
    )
    .unwrap()
}

fn policy() -> PollPolicy {
    PollPolicy::default()
        .with_jitter_ms(10, 20)
        .with_resubmit(3, 10)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Read(usize),
    AcceptDialog,
    ClickSeat(usize),
    PressSeat(usize),
    ClickWaitlist(usize),
    Confirmed,
    Back,
    Resubmit,
}

/// Scripted result page.
///
/// `passes[n]` holds the rows shown after `n` successful refreshes; the last
/// pass repeats.
struct FakePage {
    passes: Vec<Vec<RowRead>>,
    seat_clicks: Mutex<VecDeque<ClickOutcome>>,
    confirmations: Mutex<VecDeque<bool>>,
    resubmit_failures: Mutex<VecDeque<SessionError>>,
    /// One-shot read errors keyed by row
    read_failures: Mutex<HashMap<usize, SessionError>>,
    refreshes: Mutex<usize>,
    calls: Mutex<Vec<Call>>,
}

impl FakePage {
    fn new(passes: Vec<Vec<RowRead>>) -> Self {
        Self {
            passes,
            seat_clicks: Mutex::new(VecDeque::new()),
            confirmations: Mutex::new(VecDeque::new()),
            resubmit_failures: Mutex::new(VecDeque::new()),
            read_failures: Mutex::new(HashMap::new()),
            refreshes: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_seat_clicks(self, outcomes: Vec<ClickOutcome>) -> Self {
        *self.seat_clicks.lock().unwrap() = outcomes.into();
        self
    }

    fn with_confirmations(self, confirmations: Vec<bool>) -> Self {
        *self.confirmations.lock().unwrap() = confirmations.into();
        self
    }

    fn with_resubmit_failures(self, failures: Vec<SessionError>) -> Self {
        *self.resubmit_failures.lock().unwrap() = failures.into();
        self
    }

    fn with_read_failure(self, row: usize, err: SessionError) -> Self {
        self.read_failures.lock().unwrap().insert(row, err);
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }
}

impl ResultPage for FakePage {
    async fn read_row(&self, row: usize) -> Result<RowRead, SessionError> {
        self.record(Call::Read(row));
        if let Some(err) = self.read_failures.lock().unwrap().remove(&row) {
            return Err(err);
        }
        let refreshes = *self.refreshes.lock().unwrap();
        let pass = &self.passes[refreshes.min(self.passes.len() - 1)];
        Ok(pass.get(row - 1).cloned().unwrap_or(RowRead::Missing))
    }

    async fn accept_dialog(&self) -> Result<Option<String>, SessionError> {
        self.record(Call::AcceptDialog);
        Ok(None)
    }

    async fn click_seat(&self, row: usize) -> Result<ClickOutcome, SessionError> {
        self.record(Call::ClickSeat(row));
        Ok(self
            .seat_clicks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ClickOutcome::Clicked))
    }

    async fn press_seat(&self, row: usize) -> Result<ClickOutcome, SessionError> {
        self.record(Call::PressSeat(row));
        Ok(ClickOutcome::Clicked)
    }

    async fn click_waitlist(&self, row: usize) -> Result<ClickOutcome, SessionError> {
        self.record(Call::ClickWaitlist(row));
        Ok(ClickOutcome::Clicked)
    }

    async fn reservation_confirmed(&self) -> Result<bool, SessionError> {
        self.record(Call::Confirmed);
        Ok(self.confirmations.lock().unwrap().pop_front().unwrap_or(true))
    }

    async fn go_back(&self) -> Result<(), SessionError> {
        self.record(Call::Back);
        Ok(())
    }

    async fn resubmit_search(&self) -> Result<(), SessionError> {
        self.record(Call::Resubmit);
        if let Some(e) = self.resubmit_failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        *self.refreshes.lock().unwrap() += 1;
        Ok(())
    }
}

/// Notifier that records subjects, optionally failing every delivery.
struct FakeNotifier {
    sent: Mutex<Vec<String>>,
    fail: bool,
}

impl FakeNotifier {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for FakeNotifier {
    async fn notify(&self, subject: &str, _body: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(subject.to_string());
        if self.fail {
            let err = "not-an-address".parse::<lettre::Address>().unwrap_err();
            return Err(NotifyError::Address(err));
        }
        Ok(())
    }
}

async fn run(
    page: &FakePage,
    notifier: &FakeNotifier,
    criteria: &SearchCriteria,
    policy: PollPolicy,
) -> Result<ReservationOutcome, SessionError> {
    Reservation::new(page, notifier, criteria, policy, CancellationToken::new())
        .run()
        .await
}

#[tokio::test(start_paused = true)]
async fn sold_out_window_refreshes_and_never_books() {
    let page = FakePage::new(vec![pass(&[SOLD_OUT, SOLD_OUT])]);
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(true), policy().with_max_attempts(3))
        .await
        .unwrap();

    // No refresh after the last permitted pass
    assert_eq!(
        outcome,
        ReservationOutcome::Exhausted {
            attempts: 3,
            refreshes: 2
        }
    );
    assert_eq!(page.count(|c| *c == Call::Resubmit), 2);
    assert_eq!(
        page.count(|c| matches!(
            c,
            Call::ClickSeat(_) | Call::PressSeat(_) | Call::ClickWaitlist(_)
        )),
        0
    );
    assert!(notifier.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn reservable_row_books_once_and_notifies_once() {
    let page = FakePage::new(vec![pass(&[SOLD_OUT, RESERVABLE])]);
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(false), policy())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReservationOutcome::Booked {
            row: 2,
            refreshes: 0
        }
    );
    assert_eq!(
        page.calls(),
        vec![
            Call::Read(1),
            Call::AcceptDialog,
            Call::Read(2),
            Call::AcceptDialog,
            Call::ClickSeat(2),
            Call::AcceptDialog,
            Call::Confirmed,
        ]
    );
    assert_eq!(notifier.sent(), vec![BOOKED_SUBJECT.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn stale_row_is_sold_out_for_one_pass_only() {
    let page = FakePage::new(vec![
        vec![RowRead::Stale, RowRead::texts(SOLD_OUT.0, SOLD_OUT.1)],
        pass(&[RESERVABLE, SOLD_OUT]),
    ]);
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(false), policy())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReservationOutcome::Booked {
            row: 1,
            refreshes: 1
        }
    );

    // The stale pass clicked nothing; the next pass booked row 1
    let calls = page.calls();
    let resubmit = calls.iter().position(|c| *c == Call::Resubmit).unwrap();
    let click = calls
        .iter()
        .position(|c| *c == Call::ClickSeat(1))
        .unwrap();
    assert!(resubmit < click);
    assert_eq!(page.count(|c| matches!(c, Call::ClickSeat(_))), 1);
}

#[tokio::test(start_paused = true)]
async fn waitlist_only_row_books_without_seat_click() {
    let page = FakePage::new(vec![pass(&[WAITLIST_ONLY, SOLD_OUT])]);
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(true), policy())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReservationOutcome::Waitlisted {
            row: 1,
            refreshes: 0
        }
    );
    assert_eq!(page.count(|c| *c == Call::ClickWaitlist(1)), 1);
    assert_eq!(
        page.count(|c| matches!(c, Call::ClickSeat(_) | Call::PressSeat(_))),
        0
    );
    assert_eq!(notifier.sent(), vec![WAITLISTED_SUBJECT.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn waitlist_ignored_when_disabled() {
    let page = FakePage::new(vec![pass(&[WAITLIST_ONLY, WAITLIST_ONLY])]);
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(false), policy().with_max_attempts(2))
        .await
        .unwrap();

    assert!(matches!(outcome, ReservationOutcome::Exhausted { .. }));
    assert_eq!(page.count(|c| matches!(c, Call::ClickWaitlist(_))), 0);
    assert!(notifier.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_waitlist_returns_to_results() {
    let page =
        FakePage::new(vec![pass(&[WAITLIST_ONLY, SOLD_OUT])]).with_confirmations(vec![false]);
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(true), policy())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReservationOutcome::Waitlisted {
            row: 1,
            refreshes: 1
        }
    );
    assert_eq!(page.count(|c| *c == Call::Back), 1);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_start_touches_nothing() {
    let page = FakePage::new(vec![pass(&[RESERVABLE, RESERVABLE])]);
    let notifier = FakeNotifier::new();
    let criteria = criteria(true);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = Reservation::new(&page, &notifier, &criteria, policy(), cancel)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, ReservationOutcome::Aborted { refreshes: 0 });
    assert!(page.calls().is_empty());
    assert!(notifier.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancelled_during_pause() {
    let page = FakePage::new(vec![pass(&[SOLD_OUT, SOLD_OUT])]);
    let notifier = FakeNotifier::new();
    let criteria = criteria(false);
    let cancel = CancellationToken::new();

    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        token.cancel();
    });

    // Default jitter is 2-4 s, so the cancel lands mid-pause
    let outcome = Reservation::new(&page, &notifier, &criteria, PollPolicy::default(), cancel)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, ReservationOutcome::Aborted { refreshes: 0 });
    assert_eq!(page.count(|c| *c == Call::Resubmit), 0);
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_booking_goes_back_and_retries() {
    let page =
        FakePage::new(vec![pass(&[RESERVABLE, SOLD_OUT])]).with_confirmations(vec![false]);
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(false), policy())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReservationOutcome::Booked {
            row: 1,
            refreshes: 1
        }
    );
    assert_eq!(page.count(|c| *c == Call::Back), 1);
    assert_eq!(page.count(|c| *c == Call::ClickSeat(1)), 2);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_booking_falls_through_to_waitlist() {
    let page = FakePage::new(vec![pass(&[("예약하기", "신청하기"), SOLD_OUT])])
        .with_confirmations(vec![false, true]);
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(true), policy())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReservationOutcome::Waitlisted {
            row: 1,
            refreshes: 0
        }
    );
    assert_eq!(page.count(|c| *c == Call::ClickSeat(1)), 1);
    assert_eq!(page.count(|c| *c == Call::ClickWaitlist(1)), 1);
}

#[tokio::test(start_paused = true)]
async fn intercepted_click_retries_with_keyboard() {
    let page = FakePage::new(vec![pass(&[RESERVABLE, SOLD_OUT])])
        .with_seat_clicks(vec![ClickOutcome::Intercepted]);
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(false), policy())
        .await
        .unwrap();

    assert!(outcome.is_reserved());
    let calls = page.calls();
    let click = calls.iter().position(|c| *c == Call::ClickSeat(1)).unwrap();
    assert_eq!(calls[click + 1], Call::PressSeat(1));
}

#[tokio::test(start_paused = true)]
async fn dialog_blocking_click_skips_row() {
    let page = FakePage::new(vec![pass(&[RESERVABLE, SOLD_OUT])])
        .with_seat_clicks(vec![ClickOutcome::DialogOpen]);
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(false), policy())
        .await
        .unwrap();

    // Second pass books after the refresh
    assert_eq!(
        outcome,
        ReservationOutcome::Booked {
            row: 1,
            refreshes: 1
        }
    );
    assert_eq!(page.count(|c| *c == Call::Confirmed), 1);
    assert_eq!(page.count(|c| matches!(c, Call::PressSeat(_))), 0);
}

#[tokio::test(start_paused = true)]
async fn notification_failure_keeps_booking() {
    let page = FakePage::new(vec![pass(&[RESERVABLE, SOLD_OUT])]);
    let notifier = FakeNotifier::failing();

    let outcome = run(&page, &notifier, &criteria(false), policy())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReservationOutcome::Booked {
            row: 1,
            refreshes: 0
        }
    );
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_refresh_failures_are_retried() {
    let page = FakePage::new(vec![pass(&[SOLD_OUT, SOLD_OUT])]).with_resubmit_failures(vec![
        SessionError::SearchTimeout(Duration::from_secs(30)),
        SessionError::SearchTimeout(Duration::from_secs(30)),
    ]);
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(false), policy().with_max_attempts(2))
        .await
        .unwrap();

    // Two failures, then the third try of the only refresh succeeds
    assert_eq!(
        outcome,
        ReservationOutcome::Exhausted {
            attempts: 2,
            refreshes: 1
        }
    );
    assert_eq!(page.count(|c| *c == Call::Resubmit), 3);
}

#[tokio::test(start_paused = true)]
async fn refresh_gives_up_without_ending_run() {
    let page = FakePage::new(vec![pass(&[SOLD_OUT, SOLD_OUT])]).with_resubmit_failures(vec![
        SessionError::SearchTimeout(Duration::from_secs(30)),
        SessionError::SearchTimeout(Duration::from_secs(30)),
        SessionError::SearchTimeout(Duration::from_secs(30)),
    ]);
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(false), policy().with_max_attempts(3))
        .await
        .unwrap();

    // First refresh abandoned after 3 tries, second succeeds
    assert_eq!(
        outcome,
        ReservationOutcome::Exhausted {
            attempts: 3,
            refreshes: 1
        }
    );
    assert_eq!(page.count(|c| *c == Call::Resubmit), 4);
    assert_eq!(page.count(|c| *c == Call::Read(1)), 3);
}

#[tokio::test(start_paused = true)]
async fn lost_session_ends_run() {
    let page = FakePage::new(vec![pass(&[SOLD_OUT, SOLD_OUT])]).with_resubmit_failures(vec![
        SessionError::from(BrowserError::Cdp(CdpError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "devtools websocket closed",
        )))),
    ]);
    let notifier = FakeNotifier::new();

    let err = run(&page, &notifier, &criteria(false), policy())
        .await
        .unwrap_err();

    assert!(!err.is_transient());
    assert_eq!(page.count(|c| *c == Call::Resubmit), 1);
}

#[tokio::test(start_paused = true)]
async fn ceiling_skips_final_refresh() {
    let page = FakePage::new(vec![pass(&[SOLD_OUT, SOLD_OUT])]);
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(false), policy().with_max_attempts(1))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReservationOutcome::Exhausted {
            attempts: 1,
            refreshes: 0
        }
    );
    assert_eq!(page.count(|c| *c == Call::Resubmit), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_row_moves_on_to_next_row() {
    let page = FakePage::new(vec![pass(&[RESERVABLE, RESERVABLE])]).with_read_failure(
        1,
        SessionError::ElementMissing {
            what: "result row",
            selector: "tr:nth-child(1)".to_string(),
            waited: Duration::from_secs(10),
        },
    );
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(false), policy())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReservationOutcome::Booked {
            row: 2,
            refreshes: 0
        }
    );
    assert_eq!(page.calls()[..2], [Call::Read(1), Call::Read(2)]);
}

#[tokio::test(start_paused = true)]
async fn stale_read_error_recovers_next_pass() {
    let page = FakePage::new(vec![pass(&[RESERVABLE, SOLD_OUT])]).with_read_failure(
        1,
        SessionError::from(BrowserError::Stale {
            selector: "td:nth-child(7)".to_string(),
        }),
    );
    let notifier = FakeNotifier::new();

    let outcome = run(&page, &notifier, &criteria(false), policy())
        .await
        .unwrap();

    // Row 2 still inspected on the failed pass; row 1 reads normally after
    assert_eq!(
        outcome,
        ReservationOutcome::Booked {
            row: 1,
            refreshes: 1
        }
    );
    assert_eq!(page.count(|c| *c == Call::Read(1)), 2);
    assert_eq!(page.count(|c| *c == Call::Read(2)), 1);
    assert_eq!(notifier.sent(), vec![BOOKED_SUBJECT.to_string()]);
}
