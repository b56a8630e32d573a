//! Login and notification credentials.

use std::fmt;

/// SRT member login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Membership number, email or phone number
    pub id: String,
    pub password: String,
}

impl Credentials {
    pub fn new(id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sender account and recipient for email notifications.
#[derive(Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub sender: String,
    pub recipient: String,
    /// Provider app password for the sender account
    pub app_password: String,
}

impl EmailSettings {
    /// Build settings only when all three values are present and non-empty.
    ///
    /// Notifications are an all-or-nothing feature: a sender without a
    /// password cannot log in, and a password without a recipient has
    /// nowhere to send.
    pub fn from_parts(
        sender: Option<String>,
        recipient: Option<String>,
        app_password: Option<String>,
    ) -> Option<Self> {
        let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        Some(Self {
            sender: non_empty(sender)?,
            recipient: non_empty(recipient)?,
            app_password: non_empty(app_password)?,
        })
    }
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .field("app_password", &"<redacted>")
            .finish()
    }
}
