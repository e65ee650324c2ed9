//! SMTP email provider implementation using Lettre.

use crate::error::{AuthError, Result};
use crate::providers::EmailProvider;
use chrono::{DateTime, Utc};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument};

/// SMTP settings.
#[derive(Clone)]
pub struct SmtpSettings {
    /// SMTP server address (e.g. "smtp.gmail.com").
    pub host: String,
    /// SMTP server port (usually 587).
    pub port: u16,
    /// Authentication username.
    pub username: String,
    /// Authentication password.
    pub password: String,
    /// Sender email address.
    pub from_email: String,
    /// Sender display name.
    pub from_name: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish_non_exhaustive()
    }
}

/// SMTP email provider using Lettre's tokio transport.
///
/// # Examples
///
/// ```ignore
/// use gateway_auth::providers::smtp_email::{SmtpEmailProvider, SmtpSettings};
///
/// let provider = SmtpEmailProvider::new(SmtpSettings {
///     host: "smtp.gmail.com".to_string(),
///     port: 587,
///     username: "user@gmail.com".to_string(),
///     password: "app_password".to_string(),
///     from_email: "noreply@example.com".to_string(),
///     from_name: "Example App".to_string(),
/// })?;
/// ```
#[derive(Clone)]
pub struct SmtpEmailProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailProvider {
    /// Create a new SMTP email provider.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailError`] if the relay host or sender address
    /// is invalid.
    pub fn new(settings: SmtpSettings) -> Result<Self> {
        let from = format!("{} <{}>", settings.from_name, settings.from_email)
            .parse::<Mailbox>()
            .map_err(|e| AuthError::EmailError(format!("Invalid sender address: {e}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|e| AuthError::EmailError(format!("SMTP relay error: {e}")))?
            .port(settings.port)
            .credentials(Credentials::new(settings.username, settings.password))
            .build();

        Ok(Self { transport, from })
    }

    fn render(magic_link: &str, expires_minutes: i64) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>Sign in</title></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Sign in</h2>
    <p>Click the link below to sign in. It expires in {expires_minutes} minutes.</p>
    <p><a href="{magic_link}">Sign in</a></p>
    <p style="color: #666; font-size: 12px;">Or paste this link into your browser:<br>{magic_link}</p>
    <p style="color: #666; font-size: 14px;">If you didn't request this email, you can ignore it.</p>
  </div>
</body>
</html>"#
        )
    }
}

impl EmailProvider for SmtpEmailProvider {
    #[instrument(skip(self, magic_link), fields(to = %to))]
    async fn send_magic_link(
        &self,
        to: &str,
        magic_link: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let recipient = to
            .parse::<Mailbox>()
            .map_err(|e| AuthError::EmailError(format!("Invalid recipient: {e}")))?;
        let expires_minutes = (expires_at - Utc::now()).num_minutes();

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject("Sign in to your account")
            .header(ContentType::TEXT_HTML)
            .body(Self::render(magic_link, expires_minutes))
            .map_err(|e| AuthError::EmailError(format!("Failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AuthError::EmailError(format!("Failed to send email: {e}")))?;

        info!("Magic link email sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn settings(from_email: &str) -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "user".to_string(),
            password: "hunter2".to_string(),
            from_email: from_email.to_string(),
            from_name: "Gateway".to_string(),
        }
    }

    #[tokio::test]
    async fn test_builds_with_valid_settings() {
        assert!(SmtpEmailProvider::new(settings("noreply@example.com")).is_ok());
    }

    #[tokio::test]
    async fn test_rejects_invalid_sender() {
        let err = SmtpEmailProvider::new(settings("not an email")).err().unwrap();
        assert!(matches!(err, AuthError::EmailError(_)));
    }

    #[test]
    fn test_password_not_in_debug() {
        assert!(!format!("{:?}", settings("a@b.co")).contains("hunter2"));
    }

    #[test]
    fn test_render_contains_link() {
        let html = SmtpEmailProvider::render("https://x.test/magic?token=t", 30);
        assert!(html.contains("https://x.test/magic?token=t"));
        assert!(html.contains("30 minutes"));
    }
}
