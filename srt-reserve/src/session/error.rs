//! Browser session error types.

use std::time::Duration;

use crate::browser::BrowserError;

/// Errors from the browser session controller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Chrome failed to start or a DevTools command failed
    #[error(transparent)]
    Browser(#[from] BrowserError),

    /// A form element did not appear within its wait
    #[error("{what} not found (`{selector}`) within {waited:?}")]
    ElementMissing {
        what: &'static str,
        selector: String,
        waited: Duration,
    },

    /// The wanted entry is not among a select's options
    #[error("{what} has no option with {option}")]
    OptionMissing { what: &'static str, option: String },

    /// The result table never rendered after a search
    #[error("search results did not appear within {0:?}")]
    SearchTimeout(Duration),
}

impl SessionError {
    /// Errors caused by page timing that a retry may clear.
    pub fn is_transient(&self) -> bool {
        match self {
            SessionError::Browser(e) => e.is_transient(),
            SessionError::ElementMissing { .. } | SessionError::SearchTimeout(_) => true,
            SessionError::OptionMissing { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(SessionError::SearchTimeout(Duration::from_secs(30)).is_transient());

        let stale = SessionError::from(BrowserError::Stale {
            selector: "td".into(),
        });
        assert!(stale.is_transient());

        let launch = SessionError::from(BrowserError::Launch {
            message: "chrome not found".into(),
            source: None,
        });
        assert!(!launch.is_transient());

        let option = SessionError::OptionMissing {
            what: "departure date",
            option: "value `20240315`".into(),
        };
        assert!(!option.is_transient());
    }

    #[test]
    fn error_display() {
        let err = SessionError::SearchTimeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "search results did not appear within 30s");

        let err = SessionError::ElementMissing {
            what: "search button",
            selector: "input[value='조회하기']".into(),
            waited: Duration::from_secs(5),
        };
        assert_eq!(
            err.to_string(),
            "search button not found (`input[value='조회하기']`) within 5s"
        );
    }
}
