//! Browser automation over the Chrome DevTools protocol.

mod chrome;
mod driver;
mod error;
mod wait;

pub use chrome::{ChromeConfig, ChromeSession};
pub use driver::{OptionMatch, PageDriver};
pub use error::BrowserError;
pub use wait::{WaitConfig, wait_for};
