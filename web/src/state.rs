//! Application state for Axum handlers.

use gateway_auth::{Authenticator, SessionStore};
use gateway_core::EventIntakeHandler;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Generic over the API-key authenticator `A`, ingestion service `I` and
/// session store `S` so tests can run the real router over mocks.
pub struct AppState<A, I, S: SessionStore> {
    /// Event intake handler.
    pub intake: Arc<EventIntakeHandler<A, I>>,

    /// Magic-link authenticator.
    pub auth: Arc<Authenticator<S>>,

    /// Path the magic-link callback is served on.
    pub callback_path: String,

    /// Mark the session cookie `Secure`.
    pub secure_cookies: bool,
}

impl<A, I, S: SessionStore> Clone for AppState<A, I, S> {
    fn clone(&self) -> Self {
        Self {
            intake: Arc::clone(&self.intake),
            auth: Arc::clone(&self.auth),
            callback_path: self.callback_path.clone(),
            secure_cookies: self.secure_cookies,
        }
    }
}

impl<A, I, S: SessionStore> AppState<A, I, S> {
    /// Create the state.
    #[must_use]
    pub fn new(
        intake: EventIntakeHandler<A, I>,
        auth: Authenticator<S>,
        callback_path: impl Into<String>,
    ) -> Self {
        Self {
            intake: Arc::new(intake),
            auth: Arc::new(auth),
            callback_path: callback_path.into(),
            secure_cookies: false,
        }
    }

    /// Mark session cookies `Secure` (serve over HTTPS only).
    #[must_use]
    pub const fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_auth::InMemorySessionStore;
    use gateway_core::mocks::{MockApiKeyAuthenticator, MockIngestionService};

    #[test]
    fn test_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState<MockApiKeyAuthenticator, MockIngestionService, InMemorySessionStore>>();
    }

    #[test]
    fn test_clone_shares_handlers() {
        let state = AppState::new(
            EventIntakeHandler::new(MockApiKeyAuthenticator::new(), MockIngestionService::new()),
            Authenticator::new(InMemorySessionStore::new()),
            "/magic",
        )
        .with_secure_cookies(true);

        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.intake, &cloned.intake));
        assert!(Arc::ptr_eq(&state.auth, &cloned.auth));
        assert!(cloned.secure_cookies);
    }
}
