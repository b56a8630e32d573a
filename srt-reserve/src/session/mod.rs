//! Browser session on the SRT booking site.
//!
//! [`BrowserSession`] performs login and search, and implements
//! [`ResultPage`], the view of the result table the poll loop works against.

mod controller;
mod error;
mod page;
pub mod selectors;

pub use controller::{BrowserSession, SessionConfig, SessionWaits};
pub use error::SessionError;
pub use page::{ClickOutcome, ResultPage, RowRead};
