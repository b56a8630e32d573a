//! The reservation poll loop.
//!
//! Inspects a fixed window of result rows, tries to book (or wait-list) the
//! first actionable one, and otherwise re-submits the search after a short
//! randomised pause. Runs until something is reserved, the run is cancelled,
//! or the policy's ceiling is reached.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::SearchCriteria;
use crate::notify::Notifier;
use crate::session::{ClickOutcome, ResultPage, SessionError};

use super::policy::PollPolicy;
use super::state::{LoopState, ReservationOutcome};
use super::status::RowStatus;

/// Subject of the email sent after a seat is booked.
pub const BOOKED_SUBJECT: &str = "SRT 예약 완료";
/// Subject of the email sent after joining a wait-list.
pub const WAITLISTED_SUBJECT: &str = "SRT 예약 대기 완료";

/// What a successful row inspection secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Secured {
    Seat(usize),
    Waitlist(usize),
}

/// One reservation run over an already-searched result page.
pub struct Reservation<'a, P, N> {
    page: &'a P,
    notifier: &'a N,
    criteria: &'a SearchCriteria,
    policy: PollPolicy,
    cancel: CancellationToken,
}

impl<'a, P: ResultPage, N: Notifier> Reservation<'a, P, N> {
    pub fn new(
        page: &'a P,
        notifier: &'a N,
        criteria: &'a SearchCriteria,
        policy: PollPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            page,
            notifier,
            criteria,
            policy,
            cancel,
        }
    }

    /// Poll until a seat or wait-list place is secured, the run is cancelled,
    /// or the policy's ceiling is reached.
    ///
    /// Only failures the page cannot recover from are returned as errors.
    pub async fn run(&self) -> Result<ReservationOutcome, SessionError> {
        let mut state = LoopState::new();

        loop {
            if self.cancel.is_cancelled() {
                info!(refreshes = state.refreshes(), "reservation cancelled");
                return Ok(ReservationOutcome::Aborted {
                    refreshes: state.refreshes(),
                });
            }

            if self.policy.ceiling_reached(&state) {
                info!(
                    attempts = state.attempts(),
                    refreshes = state.refreshes(),
                    elapsed_secs = state.elapsed().as_secs(),
                    "poll ceiling reached"
                );
                return Ok(ReservationOutcome::Exhausted {
                    attempts: state.attempts(),
                    refreshes: state.refreshes(),
                });
            }

            state.begin_attempt();

            if let Some(secured) = self.inspect_window().await? {
                return Ok(self.finish(secured, &mut state).await);
            }

            // The loop head reports the ceiling or the cancellation
            if self.policy.ceiling_reached(&state) || !self.pause().await {
                continue;
            }
            self.refresh(&mut state).await?;
        }
    }

    /// Check each row in the window once.
    async fn inspect_window(&self) -> Result<Option<Secured>, SessionError> {
        for row in self.criteria.window.rows() {
            if self.cancel.is_cancelled() {
                return Ok(None);
            }

            match self.inspect_row(row).await {
                Ok(Some(secured)) => return Ok(Some(secured)),
                Ok(None) => {}
                Err(e) if e.is_transient() => {
                    warn!(row, error = %e, "row inspection interrupted, moving on");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    async fn inspect_row(&self, row: usize) -> Result<Option<Secured>, SessionError> {
        let read = self.page.read_row(row).await?;
        let status = RowStatus::from_read(&read);
        debug!(row, ?status, "row read");

        if let Some(text) = self.page.accept_dialog().await? {
            info!(row, dialog = %text, "dismissed dialog before acting");
        }

        let waitlist_open = match status {
            RowStatus::Reservable { waitlist_open } => {
                if self.try_book(row).await? {
                    return Ok(Some(Secured::Seat(row)));
                }
                waitlist_open
            }
            RowStatus::WaitlistOpen => true,
            RowStatus::SoldOut | RowStatus::Unknown => false,
        };

        if waitlist_open && self.criteria.waitlist && self.try_waitlist(row).await? {
            return Ok(Some(Secured::Waitlist(row)));
        }

        Ok(None)
    }

    /// Click the seat action and check for the confirmation page.
    ///
    /// Returns to the result list when the booking falls through.
    async fn try_book(&self, row: usize) -> Result<bool, SessionError> {
        let mut outcome = self.page.click_seat(row).await?;
        if outcome == ClickOutcome::Intercepted {
            debug!(row, "seat click intercepted, retrying with keyboard");
            outcome = self.page.press_seat(row).await?;
        }

        if !self.activated(row, outcome).await? {
            return Ok(false);
        }
        info!(row, "seat action clicked");

        if let Some(text) = self.page.accept_dialog().await? {
            info!(row, dialog = %text, "dialog after seat click");
        }

        if self.page.reservation_confirmed().await? {
            return Ok(true);
        }

        info!(row, "no seat left, returning to results");
        self.page.go_back().await?;
        Ok(false)
    }

    /// Click the wait-list action and check for the confirmation page.
    async fn try_waitlist(&self, row: usize) -> Result<bool, SessionError> {
        let outcome = self.page.click_waitlist(row).await?;
        if !self.activated(row, outcome).await? {
            return Ok(false);
        }
        info!(row, "wait-list action clicked");

        if let Some(text) = self.page.accept_dialog().await? {
            info!(row, dialog = %text, "dialog after wait-list click");
        }

        if self.page.reservation_confirmed().await? {
            return Ok(true);
        }

        info!(row, "wait-list not confirmed, returning to results");
        self.page.go_back().await?;
        Ok(false)
    }

    /// Whether a click landed. A dialog that swallowed it is dismissed.
    async fn activated(&self, row: usize, outcome: ClickOutcome) -> Result<bool, SessionError> {
        match outcome {
            ClickOutcome::Clicked => Ok(true),
            ClickOutcome::DialogOpen => {
                if let Some(text) = self.page.accept_dialog().await? {
                    info!(row, dialog = %text, "dialog blocked the click");
                }
                Ok(false)
            }
            other => {
                debug!(row, outcome = ?other, "action not activated");
                Ok(false)
            }
        }
    }

    /// Record the reservation and send the one notification.
    async fn finish(&self, secured: Secured, state: &mut LoopState) -> ReservationOutcome {
        let first = state.mark_booked();
        let refreshes = state.refreshes();

        let (outcome, subject, body) = match secured {
            Secured::Seat(row) => (
                ReservationOutcome::Booked { row, refreshes },
                BOOKED_SUBJECT,
                format!("{row}번째 열차 예약이 완료되었습니다. 결제를 진행해 주세요."),
            ),
            Secured::Waitlist(row) => (
                ReservationOutcome::Waitlisted { row, refreshes },
                WAITLISTED_SUBJECT,
                format!("{row}번째 열차 예약 대기가 신청되었습니다."),
            ),
        };
        info!(%outcome, "reservation secured");

        if first {
            if let Err(e) = self.notifier.notify(subject, &body).await {
                warn!(error = %e, "failed to send reservation notification");
            }
        }

        outcome
    }

    /// Sleep for the policy's jitter. Returns `false` if cancelled first.
    async fn pause(&self) -> bool {
        let pause = self.policy.jitter();
        debug!(pause_ms = pause.as_millis() as u64, "nothing actionable, pausing");

        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(pause) => true,
        }
    }

    /// Re-submit the search, retrying transient failures.
    ///
    /// Giving up only skips this refresh; the next pass reads whatever page
    /// is showing.
    async fn refresh(&self, state: &mut LoopState) -> Result<(), SessionError> {
        let attempts = self.policy.resubmit_attempts.max(1);

        for attempt in 1..=attempts {
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            match self.page.resubmit_search().await {
                Ok(()) => {
                    state.record_refresh();
                    info!(refreshes = state.refreshes(), "search refreshed");
                    return Ok(());
                }
                Err(e) if e.is_transient() => {
                    warn!(attempt, attempts, error = %e, "search refresh failed");
                    if attempt < attempts {
                        tokio::select! {
                            _ = self.cancel.cancelled() => return Ok(()),
                            _ = tokio::time::sleep(self.policy.resubmit_backoff()) => {}
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }

        warn!(attempts, "giving up on this refresh");
        Ok(())
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
