//! Browser session controller.
//!
//! Owns the browser tab and performs the site-level steps of a run: login,
//! login verification and search.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::{
    BrowserError, ChromeConfig, ChromeSession, OptionMatch, PageDriver, WaitConfig, wait_for,
};
use crate::domain::{Credentials, SearchCriteria};

use super::error::SessionError;
use super::page::{ClickOutcome, ResultPage, RowRead};
use super::selectors::*;

/// Timeouts for each kind of wait the session performs.
#[derive(Debug, Clone)]
pub struct SessionWaits {
    /// Form fields and buttons
    pub element: WaitConfig,
    /// Welcome marker after login
    pub login_check: WaitConfig,
    /// Result table after a search
    pub results: WaitConfig,
    /// Confirmation marker after a reservation click
    pub confirmation: WaitConfig,
    /// Pause after accepting a dialog
    pub dialog_settle: Duration,
    /// Pause between re-submitting the search and checking for results
    pub refresh_settle: Duration,
}

impl Default for SessionWaits {
    fn default() -> Self {
        Self {
            element: WaitConfig::new(Duration::from_secs(10)),
            login_check: WaitConfig::new(Duration::from_secs(10)),
            results: WaitConfig::new(Duration::from_secs(30)),
            confirmation: WaitConfig::new(Duration::from_secs(3))
                .with_poll_interval(Duration::from_millis(100)),
            dialog_settle: Duration::from_secs(1),
            refresh_settle: Duration::from_millis(500),
        }
    }
}

/// How to obtain a browser.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub chrome: ChromeConfig,
    pub waits: SessionWaits,
}

impl SessionConfig {
    pub fn new(chrome: ChromeConfig) -> Self {
        Self {
            chrome,
            waits: SessionWaits::default(),
        }
    }
}

/// How a result action is activated.
#[derive(Debug, Clone, Copy)]
enum Activation {
    Click,
    Enter,
}

/// A live browser on the SRT site.
pub struct BrowserSession<D = ChromeSession> {
    driver: D,
    waits: SessionWaits,
}

impl BrowserSession<ChromeSession> {
    /// Launch Chrome (or attach to it) and open a tab.
    pub async fn start(config: &SessionConfig) -> Result<Self, SessionError> {
        let driver = ChromeSession::launch(&config.chrome).await?;
        Ok(Self::new(driver, config.waits.clone()))
    }

    /// Close the tab and the browser this session launched.
    pub async fn shutdown(self) -> Result<(), SessionError> {
        self.driver.close().await?;
        info!("browser closed");
        Ok(())
    }
}

impl<D: PageDriver> BrowserSession<D> {
    pub fn new(driver: D, waits: SessionWaits) -> Self {
        Self { driver, waits }
    }

    /// Fill in and submit the login form.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), SessionError> {
        self.driver.goto(LOGIN_URL).await?;

        self.fill("login id field", LOGIN_ID_FIELD, &credentials.id)
            .await?;
        self.fill("password field", LOGIN_PASSWORD_FIELD, &credentials.password)
            .await?;
        self.click("login button", LOGIN_SUBMIT).await?;

        info!(id = %credentials.id, "login submitted");
        Ok(())
    }

    /// Wait (bounded) for the member welcome text.
    ///
    /// Returns `false` if the site shows a rejection dialog or the welcome
    /// text does not appear in time.
    pub async fn verify_login(&self) -> Result<bool, SessionError> {
        let verdict = wait_for(self.waits.login_check, move || self.login_verdict()).await?;
        let logged_in = verdict.unwrap_or(false);

        if logged_in {
            info!("login verified");
        } else {
            warn!(
                waited = ?self.waits.login_check.timeout,
                "welcome marker not found after login"
            );
        }
        Ok(logged_in)
    }

    /// One check for login success: `Some(true)` welcomed, `Some(false)`
    /// rejected, `None` undecided.
    async fn login_verdict(&self) -> Result<Option<bool>, BrowserError> {
        if let Some(text) = self.driver.accept_dialog().await? {
            warn!(dialog = %text, "login rejected by site");
            return Ok(Some(false));
        }

        match self.driver.text(WELCOME_AREA).await {
            Ok(Some(text)) if text.contains(WELCOME_TEXT) => Ok(Some(true)),
            Ok(_) | Err(BrowserError::Stale { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fill in the search form, submit it, and wait for the result table.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<(), SessionError> {
        self.driver.goto(SEARCH_URL).await?;

        self.fill(
            "departure station field",
            DEPARTURE_FIELD,
            criteria.departure.as_str(),
        )
        .await?;
        self.fill(
            "arrival station field",
            ARRIVAL_FIELD,
            criteria.arrival.as_str(),
        )
        .await?;

        let date = criteria.date.to_option_value();
        self.choose("departure date", DATE_SELECT, OptionMatch::Value(&date))
            .await?;
        let hour = criteria.hour.to_option_text();
        self.choose("departure hour", HOUR_SELECT, OptionMatch::Text(&hour))
            .await?;

        info!(
            departure = %criteria.departure,
            arrival = %criteria.arrival,
            date = %criteria.date,
            after_hour = %criteria.hour,
            rows = ?criteria.window.rows(),
            waitlist = criteria.waitlist,
            "searching trains"
        );

        self.click("search button", SEARCH_SUBMIT).await?;
        self.wait_for_results().await
    }

    async fn fill(
        &self,
        what: &'static str,
        selector: &str,
        text: &str,
    ) -> Result<(), SessionError> {
        self.require(what, selector).await?;
        if !self.driver.fill(selector, text).await? {
            return Err(self.missing(what, selector));
        }
        Ok(())
    }

    async fn choose(
        &self,
        what: &'static str,
        selector: &str,
        option: OptionMatch<'_>,
    ) -> Result<(), SessionError> {
        self.require(what, selector).await?;
        if !self.driver.choose(selector, option).await? {
            return Err(SessionError::OptionMissing {
                what,
                option: option.to_string(),
            });
        }
        Ok(())
    }

    async fn click(&self, what: &'static str, selector: &str) -> Result<(), SessionError> {
        self.require(what, selector).await?;
        if !self.driver.click(selector).await? {
            return Err(self.missing(what, selector));
        }
        Ok(())
    }

    async fn wait_for_results(&self) -> Result<(), SessionError> {
        let wait = self.waits.results;
        if self.wait_for_element(&results_ready(), wait).await? {
            Ok(())
        } else {
            Err(SessionError::SearchTimeout(wait.timeout))
        }
    }

    /// Look up an element once. Stale and dialog-blocked lookups are "not
    /// there yet".
    async fn present(&self, selector: &str) -> Result<Option<()>, BrowserError> {
        if self.driver.pending_dialog().await.is_some() {
            return Ok(None);
        }
        match self.driver.exists(selector).await {
            Ok(true) => Ok(Some(())),
            Ok(false) | Err(BrowserError::Stale { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn wait_for_element(
        &self,
        selector: &str,
        wait: WaitConfig,
    ) -> Result<bool, SessionError> {
        let found = wait_for(wait, move || self.present(selector)).await?;
        Ok(found.is_some())
    }

    async fn require(&self, what: &'static str, selector: &str) -> Result<(), SessionError> {
        if self.wait_for_element(selector, self.waits.element).await? {
            Ok(())
        } else {
            Err(self.missing(what, selector))
        }
    }

    fn missing(&self, what: &'static str, selector: &str) -> SessionError {
        SessionError::ElementMissing {
            what,
            selector: selector.to_string(),
            waited: self.waits.element.timeout,
        }
    }

    async fn try_read_row(&self, row: usize) -> Result<RowRead, BrowserError> {
        let seat = self.driver.text(&result_cell(row, SEAT_COLUMN)).await?;
        let waitlist = self.driver.text(&result_cell(row, WAITLIST_COLUMN)).await?;

        Ok(match (seat, waitlist) {
            (Some(seat), Some(waitlist)) => RowRead::texts(seat, waitlist),
            _ => RowRead::Missing,
        })
    }

    async fn activate(
        &self,
        selector: String,
        activation: Activation,
    ) -> Result<ClickOutcome, SessionError> {
        if self.driver.pending_dialog().await.is_some() {
            return Ok(ClickOutcome::DialogOpen);
        }

        let activated = match activation {
            Activation::Click => self.driver.click(&selector).await,
            Activation::Enter => self.driver.press_enter(&selector).await,
        };

        match activated {
            Ok(true) => Ok(ClickOutcome::Clicked),
            Ok(false) => Ok(ClickOutcome::Missing),
            Err(BrowserError::NotClickable { reason, .. }) => {
                debug!(%selector, %reason, "click intercepted");
                Ok(ClickOutcome::Intercepted)
            }
            Err(BrowserError::Stale { .. }) => Ok(ClickOutcome::Stale),
            Err(BrowserError::DialogOpen(_)) => Ok(ClickOutcome::DialogOpen),
            Err(e) => Err(e.into()),
        }
    }
}

impl<D: PageDriver> ResultPage for BrowserSession<D> {
    async fn read_row(&self, row: usize) -> Result<RowRead, SessionError> {
        if let Some(dialog) = self.driver.pending_dialog().await {
            debug!(row, %dialog, "row read blocked by dialog");
            return Ok(RowRead::Stale);
        }

        match self.try_read_row(row).await {
            Ok(read) => Ok(read),
            Err(e @ (BrowserError::Stale { .. } | BrowserError::DialogOpen(_))) => {
                debug!(row, error = %e, "row read interrupted");
                Ok(RowRead::Stale)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn accept_dialog(&self) -> Result<Option<String>, SessionError> {
        let Some(text) = self.driver.accept_dialog().await? else {
            return Ok(None);
        };
        sleep(self.waits.dialog_settle).await;
        Ok(Some(text))
    }

    async fn click_seat(&self, row: usize) -> Result<ClickOutcome, SessionError> {
        self.activate(result_action(row, SEAT_COLUMN), Activation::Click)
            .await
    }

    async fn press_seat(&self, row: usize) -> Result<ClickOutcome, SessionError> {
        self.activate(result_action(row, SEAT_COLUMN), Activation::Enter)
            .await
    }

    async fn click_waitlist(&self, row: usize) -> Result<ClickOutcome, SessionError> {
        self.activate(result_action(row, WAITLIST_COLUMN), Activation::Click)
            .await
    }

    async fn reservation_confirmed(&self) -> Result<bool, SessionError> {
        self.wait_for_element(CONFIRMATION_MARKER, self.waits.confirmation)
            .await
    }

    async fn go_back(&self) -> Result<(), SessionError> {
        self.driver.back().await?;

        if !self
            .wait_for_element(&results_ready(), self.waits.element)
            .await?
        {
            debug!("result table not visible after navigating back");
        }
        Ok(())
    }

    async fn resubmit_search(&self) -> Result<(), SessionError> {
        self.require("search button", SEARCH_SUBMIT).await?;
        if !self.driver.script_click(SEARCH_SUBMIT).await? {
            return Err(self.missing("search button", SEARCH_SUBMIT));
        }

        sleep(self.waits.refresh_settle).await;
        self.wait_for_results().await
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
