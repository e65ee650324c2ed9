//! Strategy registry and session bookkeeping.

use crate::config::MagicLinkConfig;
use crate::constants::{SESSION_ERROR_KEY, SESSION_USER_KEY};
use crate::error::{AuthError, Result};
use crate::providers::{EmailProvider, PostAuthentication, SessionStore, UserRepository};
use crate::state::{AuthUser, SessionId, UserId};
use crate::strategies::{
    EmailLinkStrategy, SessionHandle, Strategy, StrategyOutcome, StrategyRequest,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Runs registered strategies against a session store.
///
/// On success the authenticated user is stored in the session under
/// [`SESSION_USER_KEY`]. Errors are returned unchanged; the caller decides
/// whether to keep a link error for the failure page with
/// [`record_error`](Self::record_error). A failed attempt writes nothing to
/// the session.
pub struct Authenticator<S: SessionStore> {
    sessions: S,
    strategies: HashMap<&'static str, Arc<dyn Strategy<S>>>,
}

impl<S: SessionStore + Clone> Clone for Authenticator<S> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            strategies: self.strategies.clone(),
        }
    }
}

impl<S: SessionStore> std::fmt::Debug for Authenticator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<S: SessionStore> Authenticator<S> {
    /// Create an authenticator with no strategies.
    #[must_use]
    pub fn new(sessions: S) -> Self {
        Self {
            sessions,
            strategies: HashMap::new(),
        }
    }

    /// Register a strategy under its name, replacing any previous one.
    pub fn use_strategy(&mut self, strategy: impl Strategy<S> + 'static) -> &mut Self {
        let name = strategy.name();
        if self.strategies.insert(name, Arc::new(strategy)).is_some() {
            warn!(strategy = name, "Replaced authentication strategy");
        }
        self
    }

    /// Whether a strategy is registered under `name`.
    #[must_use]
    pub fn has_strategy(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// The session store.
    #[must_use]
    pub const fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Run strategy `name` for one request.
    ///
    /// # Errors
    ///
    /// - [`AuthError::UnknownStrategy`] if nothing is registered as `name`
    /// - the strategy's error, unchanged
    #[instrument(skip(self, request), fields(session_id = %session_id))]
    pub async fn authenticate(
        &self,
        name: &str,
        request: StrategyRequest,
        session_id: SessionId,
    ) -> Result<StrategyOutcome> {
        let strategy = self
            .strategies
            .get(name)
            .cloned()
            .ok_or_else(|| AuthError::UnknownStrategy(name.to_string()))?;

        let result = strategy
            .authenticate(request, SessionHandle::new(&self.sessions, session_id))
            .await;

        match &result {
            Ok(StrategyOutcome::Authenticated(user)) => {
                self.sessions
                    .set(session_id, SESSION_USER_KEY, user.user_id.to_string())
                    .await?;
                self.sessions.remove(session_id, SESSION_ERROR_KEY).await?;
                info!(user_id = %user.user_id, "Session authenticated");
            }
            Ok(StrategyOutcome::LinkSent(_)) => {
                self.sessions.remove(session_id, SESSION_ERROR_KEY).await?;
            }
            Err(_) => {}
        }

        result
    }

    /// Keep a link error under [`SESSION_ERROR_KEY`] for the failure page.
    ///
    /// Other errors are not user-facing and are ignored.
    ///
    /// # Errors
    ///
    /// Returns error if the session store fails.
    pub async fn record_error(&self, session_id: SessionId, error: &AuthError) -> Result<()> {
        if error.is_link_error() {
            self.sessions
                .set(session_id, SESSION_ERROR_KEY, error.to_string())
                .await?;
        }
        Ok(())
    }

    /// The user signed in on this session, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the session store fails.
    pub async fn current_user(&self, session_id: SessionId) -> Result<Option<AuthUser>> {
        let stored = self.sessions.get(session_id, SESSION_USER_KEY).await?;
        Ok(stored
            .and_then(|raw| uuid::Uuid::parse_str(&raw).ok())
            .map(|id| AuthUser { user_id: UserId(id) }))
    }

    /// Remove and return the last authentication error for this session.
    ///
    /// # Errors
    ///
    /// Returns error if the session store fails.
    pub async fn take_error(&self, session_id: SessionId) -> Result<Option<String>> {
        self.sessions.remove(session_id, SESSION_ERROR_KEY).await
    }
}

/// Build the email-link strategy and register it on `authenticator`.
///
/// `config` must already be validated (see [`MagicLinkConfig::from_env`]),
/// so a missing secret stops the process before this is reached.
pub fn register_email_link_strategy<S, E, U, P>(
    authenticator: &mut Authenticator<S>,
    config: MagicLinkConfig,
    email: E,
    users: U,
    hook: P,
) where
    S: SessionStore,
    E: EmailProvider + 'static,
    U: UserRepository + 'static,
    P: PostAuthentication + 'static,
{
    info!(
        callback = %config.callback_url(),
        ttl_minutes = config.link_ttl.num_minutes(),
        "Registering email-link strategy"
    );
    authenticator.use_strategy(EmailLinkStrategy::new(config, email, users, hook));
}
