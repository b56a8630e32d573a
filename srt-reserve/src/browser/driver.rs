//! Page-level browser operations.

use std::fmt;

use super::error::BrowserError;

/// Which option of a `<select>` to choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMatch<'a> {
    /// The option's `value` attribute
    Value(&'a str),
    /// The option's visible text, trimmed
    Text(&'a str),
}

impl fmt::Display for OptionMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionMatch::Value(value) => write!(f, "value `{value}`"),
            OptionMatch::Text(text) => write!(f, "text `{text}`"),
        }
    }
}

/// One browser tab, addressed by CSS selectors.
///
/// Element operations act on the first match and return `false` when
/// nothing matches. None of them wait; callers bound their own waits.
#[allow(async_fn_in_trait)]
pub trait PageDriver {
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Navigate one entry back in history.
    async fn back(&self) -> Result<(), BrowserError>;

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError>;

    /// Rendered text of the element, `None` when absent.
    async fn text(&self, selector: &str) -> Result<Option<String>, BrowserError>;

    /// Clear an input and type `text` into it.
    async fn fill(&self, selector: &str, text: &str) -> Result<bool, BrowserError>;

    /// Choose an option of a `<select>`. `false` when the select or the
    /// option is absent.
    async fn choose(
        &self,
        selector: &str,
        option: OptionMatch<'_>,
    ) -> Result<bool, BrowserError>;

    /// Mouse click at the element's centre.
    async fn click(&self, selector: &str) -> Result<bool, BrowserError>;

    /// Focus the element and press Enter on it.
    async fn press_enter(&self, selector: &str) -> Result<bool, BrowserError>;

    /// Click from script, which overlays cannot intercept.
    async fn script_click(&self, selector: &str) -> Result<bool, BrowserError>;

    /// Message of the open JavaScript dialog, if any.
    async fn pending_dialog(&self) -> Option<String>;

    /// Accept the open dialog and return its message.
    async fn accept_dialog(&self) -> Result<Option<String>, BrowserError>;
}
