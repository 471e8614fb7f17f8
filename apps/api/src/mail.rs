//! Outgoing mail. The service only composes messages; delivery sits behind
//! the `Mailer` trait so a real transport can be plugged into `AppState`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    pub fn email_verification(to: &str, base_url: &str, token: &str) -> Self {
        MailMessage {
            to: to.to_string(),
            subject: "Email Verification".to_string(),
            body: format!(
                "Confirm your email address by opening this link:\n\n\
                 {base_url}/api/auth/confirmed_email/{token}\n"
            ),
        }
    }

    pub fn password_reset(to: &str, token: &str) -> Self {
        MailMessage {
            to: to.to_string(),
            subject: "Password Reset Request".to_string(),
            body: format!(
                "Use this token to reset your password:\n\n{token}\n\n\
                 If you did not ask for a reset, ignore this message.\n"
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()>;
}

/// Default mailer: writes the message to the log instead of delivering it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "Outgoing mail:\n{}",
            message.body
        );
        Ok(())
    }
}

/// Delivery failures are logged, never returned: the request that triggered
/// the mail still succeeds and the user can ask for it again.
pub async fn deliver(mailer: &Arc<dyn Mailer>, message: MailMessage) {
    let to = message.to.clone();
    if let Err(e) = mailer.send(message).await {
        warn!("Failed to send mail to {to}: {e:#}");
    }
}

#[cfg(test)]
pub use recording::RecordingMailer;
