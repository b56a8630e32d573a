//! Notification error types.

/// Errors from sending an email notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Sender or recipient is not a valid mailbox
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Message could not be assembled
    #[error("failed to build email: {0}")]
    Message(#[from] lettre::error::Error),

    /// SMTP connection, authentication or delivery failed
    #[error("email delivery failed: {0}")]
    Delivery(#[from] lettre::transport::smtp::Error),
}
