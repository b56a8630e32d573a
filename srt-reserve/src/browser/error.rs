//! Browser error types.

use chromiumoxide::error::CdpError;

/// DevTools failures meaning the node was replaced under us.
const STALE_MESSAGES: &[&str] = &[
    "No node with given id",
    "Could not find node with given id",
    "Node is detached from document",
    "Cannot find context with specified id",
    "Could not find object with given id",
];

/// DevTools failures meaning a mouse event cannot land on the node.
const UNCLICKABLE_MESSAGES: &[&str] = &[
    "Could not compute box model",
    "Node is either not visible or not an HTMLElement",
    "Node does not have a layout object",
];

/// Errors from driving Chrome.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// Chrome could not be launched or attached to
    #[error("failed to start browser: {message}")]
    Launch {
        message: String,
        #[source]
        source: Option<CdpError>,
    },

    /// The element was replaced between lookup and use
    #[error("element `{selector}` went stale")]
    Stale { selector: String },

    /// The element exists but cannot receive a click
    #[error("element `{selector}` cannot be clicked: {reason}")]
    NotClickable { selector: String, reason: String },

    /// A JavaScript dialog is open and blocks the page
    #[error("page blocked by dialog: {0}")]
    DialogOpen(String),

    /// Chrome did not answer a command in time
    #[error("browser command timed out")]
    Timeout,

    #[error("script on `{selector}` failed: {message}")]
    Script { selector: String, message: String },

    #[error("devtools error: {0}")]
    Cdp(#[from] CdpError),
}

impl BrowserError {
    /// Sort a DevTools failure on `target` into the cases callers react to.
    pub fn classify(err: CdpError, target: &str) -> Self {
        match err {
            CdpError::Timeout => BrowserError::Timeout,
            CdpError::ScrollingFailed(reason) => BrowserError::NotClickable {
                selector: target.to_string(),
                reason,
            },
            other => match Failure::from_message(&other.to_string()) {
                Some(Failure::Stale) => BrowserError::Stale {
                    selector: target.to_string(),
                },
                Some(Failure::NotClickable) => BrowserError::NotClickable {
                    selector: target.to_string(),
                    reason: other.to_string(),
                },
                None => BrowserError::Cdp(other),
            },
        }
    }

    /// Errors caused by page timing that a retry may clear.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BrowserError::Stale { .. }
                | BrowserError::NotClickable { .. }
                | BrowserError::DialogOpen(_)
                | BrowserError::Timeout
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Stale,
    NotClickable,
}

impl Failure {
    fn from_message(message: &str) -> Option<Self> {
        if STALE_MESSAGES.iter().any(|m| message.contains(m)) {
            Some(Failure::Stale)
        } else if UNCLICKABLE_MESSAGES.iter().any(|m| message.contains(m)) {
            Some(Failure::NotClickable)
        } else {
            None
        }
    }
}
