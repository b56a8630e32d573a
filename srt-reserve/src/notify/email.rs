//! SMTP email notifier.

use std::time::Duration;

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::domain::EmailSettings;

use super::Notifier;
use super::error::NotifyError;

/// SMTP relay (implicit TLS on port 465).
const SMTP_HOST: &str = "smtp.gmail.com";
const SMTP_PORT: u16 = 465;

/// Sends plain-text mail through an SMTP relay with app-password auth.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    settings: EmailSettings,
    timeout: Duration,
}

impl EmailNotifier {
    pub fn new(settings: EmailSettings) -> Self {
        Self {
            settings,
            timeout: Duration::from_secs(30),
        }
    }

    /// Assemble the message without sending it.
    pub fn build_message(&self, subject: &str, body: &str) -> Result<Message, NotifyError> {
        let from: Mailbox = self.settings.sender.parse()?;
        let to: Mailbox = self.settings.recipient.parse()?;

        Ok(Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?)
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let credentials = Credentials::new(
            self.settings.sender.clone(),
            self.settings.app_password.clone(),
        );

        Ok(AsyncSmtpTransport::<Tokio1Executor>::relay(SMTP_HOST)?
            .port(SMTP_PORT)
            .credentials(credentials)
            .timeout(Some(self.timeout))
            .build())
    }
}

impl Notifier for EmailNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = self.build_message(subject, body)?;
        self.transport()?.send(message).await?;

        tracing::info!(
            recipient = %self.settings.recipient,
            subject,
            "email sent"
        );
        Ok(())
    }
}
