//! One end-to-end reservation run: browser start, login, search, poll.

use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{ConfigError, RunConfig};
use crate::notify::{EmailNotifier, Notifier};
use crate::reservation::{Reservation, ReservationOutcome};
use crate::session::{BrowserSession, SessionError};

/// Subject of the email sent when a run begins.
pub const STARTED_SUBJECT: &str = "SRT 매크로 시작";
/// Body of the email sent when a run begins.
pub const STARTED_BODY: &str = "SRT 매크로가 시작되었습니다.";

/// Attempts at the first search before giving up on the run.
pub const INITIAL_SEARCH_ATTEMPTS: u32 = 3;

/// Process exit status for each way a run can end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Booked or wait-listed
    Reserved = 0,
    Failure = 1,
    InvalidConfig = 2,
    LoginFailed = 3,
    SearchTimeout = 4,
    Aborted = 5,
    /// Attempt or time ceiling reached
    Exhausted = 6,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_outcome(outcome: &ReservationOutcome) -> Self {
        match outcome {
            ReservationOutcome::Booked { .. } | ReservationOutcome::Waitlisted { .. } => {
                ExitStatus::Reserved
            }
            ReservationOutcome::Aborted { .. } => ExitStatus::Aborted,
            ReservationOutcome::Exhausted { .. } => ExitStatus::Exhausted,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Error that ends a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The site did not accept the credentials
    #[error("login failed for {id}")]
    LoginFailure { id: String },

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl RunError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            RunError::Config(_) => ExitStatus::InvalidConfig,
            RunError::LoginFailure { .. } => ExitStatus::LoginFailed,
            RunError::Session(SessionError::SearchTimeout(_)) => ExitStatus::SearchTimeout,
            RunError::Session(_) => ExitStatus::Failure,
        }
    }
}

/// Run a reservation from browser start to shutdown.
///
/// The browser is released on every path out of this function, including
/// errors and cancellation.
pub async fn run(
    config: &RunConfig,
    cancel: CancellationToken,
) -> Result<ReservationOutcome, RunError> {
    if cancel.is_cancelled() {
        return Ok(ReservationOutcome::Aborted { refreshes: 0 });
    }

    let notifier = config.email.clone().map(EmailNotifier::new);
    if let Err(e) = notifier.notify(STARTED_SUBJECT, STARTED_BODY).await {
        warn!(error = %e, "failed to send start notification");
    }

    let session = BrowserSession::start(&config.session).await?;
    let result = drive(&session, config, &notifier, cancel).await;

    if let Err(e) = session.shutdown().await {
        warn!(error = %e, "failed to close browser cleanly");
    }

    result
}

async fn drive<N: Notifier>(
    session: &BrowserSession,
    config: &RunConfig,
    notifier: &N,
    cancel: CancellationToken,
) -> Result<ReservationOutcome, RunError> {
    tokio::select! {
        _ = cancel.cancelled() => {
            info!("cancelled before the first search completed");
            return Ok(ReservationOutcome::Aborted { refreshes: 0 });
        }
        prepared = prepare(session, config) => prepared?,
    }

    let reservation = Reservation::new(
        session,
        notifier,
        &config.criteria,
        config.policy.clone(),
        cancel,
    );
    Ok(reservation.run().await?)
}

/// Log in and run the first search.
async fn prepare(session: &BrowserSession, config: &RunConfig) -> Result<(), RunError> {
    session.login(&config.credentials).await?;
    if !session.verify_login().await? {
        return Err(RunError::LoginFailure {
            id: config.credentials.id.clone(),
        });
    }

    let mut attempt = 1;
    loop {
        match session.search(&config.criteria).await {
            Err(SessionError::SearchTimeout(waited)) if attempt < INITIAL_SEARCH_ATTEMPTS => {
                warn!(attempt, ?waited, "search results did not appear, searching again");
                attempt += 1;
            }
            result => return Ok(result?),
        }
    }
}
