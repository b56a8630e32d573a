//! Best-effort notifications.
//!
//! A failed notification is reported to the caller but never changes the
//! outcome of a reservation.

mod email;
mod error;

pub use email::EmailNotifier;
pub use error::NotifyError;

/// Something that can deliver a short text message to the user.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// No notifier configured: nothing is sent.
impl<N: Notifier> Notifier for Option<N> {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        match self {
            Some(notifier) => notifier.notify(subject, body).await,
            None => {
                tracing::debug!(subject, "notifications disabled, skipping");
                Ok(())
            }
        }
    }
}
