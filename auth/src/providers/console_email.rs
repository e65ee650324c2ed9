//! Console email provider for development and testing.

use crate::error::Result;
use crate::providers::EmailProvider;
use chrono::{DateTime, Utc};
use tracing::info;

/// Console email provider.
///
/// Logs magic links instead of sending them. Used when no SMTP server is
/// configured.
#[derive(Clone, Debug, Default)]
pub struct ConsoleEmailProvider;

impl ConsoleEmailProvider {
    /// Create a new console email provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EmailProvider for ConsoleEmailProvider {
    async fn send_magic_link(
        &self,
        to: &str,
        magic_link: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let expires_minutes = (expires_at - Utc::now()).num_minutes();

        info!(
            to = %to,
            link = %magic_link,
            expires_in = %expires_minutes,
            "Magic link email (console delivery)"
        );

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_delivery_never_fails() {
        let sent = ConsoleEmailProvider::new()
            .send_magic_link(
                "user@example.com",
                "http://localhost:3000/magic?token=abc",
                Utc::now() + chrono::Duration::minutes(30),
            )
            .await;
        tokio_test::assert_ok!(sent);
    }
}
