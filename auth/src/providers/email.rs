//! Email provider trait.

use crate::error::Result;
use chrono::{DateTime, Utc};

/// Email provider.
///
/// Abstracts over email delivery (SMTP, SendGrid, console, ...).
pub trait EmailProvider: Send + Sync {
    /// Send magic link email.
    ///
    /// # Arguments
    ///
    /// - `to`: Recipient email address
    /// - `magic_link`: Complete link including the token
    /// - `expires_at`: When the link stops working
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailError`](crate::AuthError::EmailError) if
    /// delivery fails.
    fn send_magic_link(
        &self,
        to: &str,
        magic_link: &str,
        expires_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
