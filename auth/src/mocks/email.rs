//! Mock email provider for testing.

use crate::constants::TOKEN_PARAM;
use crate::error::{AuthError, Result};
use crate::providers::EmailProvider;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::{Arc, Mutex};

/// A recorded magic link email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMagicLink {
    /// Recipient.
    pub to: String,
    /// Full link.
    pub magic_link: String,
    /// Link expiry.
    pub expires_at: DateTime<Utc>,
}

/// Mock email provider.
///
/// Records every magic link instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct MockEmailProvider {
    sent: Arc<Mutex<Vec<SentMagicLink>>>,
    fail_with: Option<AuthError>,
}

impl MockEmailProvider {
    /// Create a mock that accepts every email.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that rejects every email with `error`.
    #[must_use]
    pub fn failing(error: AuthError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    /// All recorded emails, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMagicLink> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Number of recorded emails.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or_default()
    }

    /// The most recent link.
    #[must_use]
    pub fn last_link(&self) -> Option<String> {
        self.sent().pop().map(|sent| sent.magic_link)
    }

    /// Extract the token query parameter from a link.
    #[must_use]
    pub fn token_from_link(link: &str) -> Option<String> {
        let (_, query) = link.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == TOKEN_PARAM)
            .and_then(|(_, value)| urlencoding::decode(value).ok())
            .map(std::borrow::Cow::into_owned)
    }
}

impl EmailProvider for MockEmailProvider {
    fn send_magic_link(
        &self,
        to: &str,
        magic_link: &str,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send {
        let sent = Arc::clone(&self.sent);
        let fail_with = self.fail_with.clone();
        let record = SentMagicLink {
            to: to.to_string(),
            magic_link: magic_link.to_string(),
            expires_at,
        };

        async move {
            if let Some(error) = fail_with {
                return Err(error);
            }
            sent.lock()
                .map_err(|_| AuthError::InternalError("mock lock poisoned".to_string()))?
                .push(record);
            Ok(())
        }
    }
}
