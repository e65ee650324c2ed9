//! Passwordless email-link strategy.
//!
//! # Flow
//!
//! ```text
//! POST form {email}          GET /magic?token=...
//!      │                           │
//!      ▼                           ▼
//! send_link                    callback
//!  ├─ validate email            ├─ open token      (MagicLinkInvalid)
//!  ├─ seal {email, form, t}     ├─ check age       (MagicLinkExpired)
//!  ├─ email the link            ├─ match session   (MagicLinkMismatch, optional)
//!  └─ remember token            └─ verify
//!                                   ├─ find_or_create_user(MAGIC_LINK)
//!                                   ├─ post_authentication hook
//!                                   └─ AuthUser { user_id }
//! ```

use super::{SessionHandle, Strategy, StrategyOutcome, StrategyRequest};
use crate::config::MagicLinkConfig;
use crate::constants::{EMAIL_FIELD, SESSION_EMAIL_KEY, STRATEGY_NAME, TOKEN_PARAM};
use crate::error::{AuthError, Result};
use crate::providers::{
    EmailProvider, FindOrCreateUser, PostAuthentication, PostAuthenticationContext, SessionStore,
    UserRepository,
};
use crate::seal::{LinkPayload, LinkSealer};
use crate::state::{AuthUser, AuthenticationMethod, Form};
use crate::utils::is_valid_email;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use constant_time_eq::constant_time_eq;
use tracing::{debug, info, instrument, warn};

/// Confirmation that a link was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicLinkSent {
    /// Address the link went to.
    pub email: String,

    /// When the link stops working.
    pub expires_at: DateTime<Utc>,
}

/// Input to [`EmailLinkStrategy::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyParams {
    /// Email the link was issued for.
    pub email: String,

    /// Form fields from the original submission.
    pub form: Form,

    /// `true` when called from a link callback.
    pub magic_link_verify: bool,
}

/// Email-link strategy.
///
/// Registered under [`STRATEGY_NAME`].
pub struct EmailLinkStrategy<E, U, P> {
    config: MagicLinkConfig,
    sealer: LinkSealer,
    email: E,
    users: U,
    hook: P,
}

impl<E, U, P> std::fmt::Debug for EmailLinkStrategy<E, U, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailLinkStrategy")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<E, U, P> EmailLinkStrategy<E, U, P>
where
    E: EmailProvider,
    U: UserRepository,
    P: PostAuthentication,
{
    /// Create the strategy.
    #[must_use]
    pub fn new(config: MagicLinkConfig, email: E, users: U, hook: P) -> Self {
        let sealer = LinkSealer::from_secret(config.secret.expose());
        Self {
            config,
            sealer,
            email,
            users,
            hook,
        }
    }

    /// Strategy configuration.
    #[must_use]
    pub const fn config(&self) -> &MagicLinkConfig {
        &self.config
    }

    /// Email a sign-in link for the address in `form`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidEmail`] if the email is missing or malformed
    /// - [`AuthError::EmailError`] if delivery fails
    /// - session store errors
    #[instrument(skip(self, form, session), fields(session_id = %session.id()))]
    pub async fn send_link<S: SessionStore>(
        &self,
        form: Form,
        session: &SessionHandle<'_, S>,
    ) -> Result<MagicLinkSent> {
        let email = form
            .get(EMAIL_FIELD)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AuthError::InvalidEmail {
                reason: "Email is required".to_string(),
            })?;

        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail {
                reason: "Email is not valid".to_string(),
            });
        }

        let created_at = Utc::now();
        let expires_at = created_at + self.config.link_ttl;
        let token = self.sealer.seal(&LinkPayload {
            email: email.clone(),
            form,
            created_at,
        })?;

        let magic_link = format!(
            "{}?{TOKEN_PARAM}={}",
            self.config.callback_url(),
            urlencoding::encode(&token)
        );

        self.email
            .send_magic_link(&email, &magic_link, expires_at)
            .await?;

        session
            .set(&self.config.session_magic_link_key, token)
            .await?;
        session.set(SESSION_EMAIL_KEY, email.clone()).await?;

        info!("Magic link sent");

        Ok(MagicLinkSent { email, expires_at })
    }

    /// Complete a login from a link token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MagicLinkInvalid`] if the token cannot be opened
    /// - [`AuthError::MagicLinkExpired`] if the link is older than the TTL
    /// - [`AuthError::MagicLinkMismatch`] if session matching is on and the
    ///   session holds a different link
    /// - any error from [`verify`](Self::verify), unchanged
    #[instrument(skip(self, token, session), fields(session_id = %session.id()))]
    pub async fn callback<S: SessionStore>(
        &self,
        token: &str,
        session: &SessionHandle<'_, S>,
    ) -> Result<AuthUser> {
        let payload = self.sealer.open(token)?;

        if Utc::now() - payload.created_at > self.config.link_ttl {
            warn!("Magic link expired");
            return Err(AuthError::MagicLinkExpired);
        }

        if self.config.validate_session_magic_link {
            let stored = session.get(&self.config.session_magic_link_key).await?;
            let matches = stored
                .as_deref()
                .is_some_and(|stored| constant_time_eq(stored.as_bytes(), token.as_bytes()));
            if !matches {
                warn!("Magic link does not match session");
                return Err(AuthError::MagicLinkMismatch);
            }
        }

        session.remove(&self.config.session_magic_link_key).await?;

        self.verify(VerifyParams {
            email: payload.email,
            form: payload.form,
            magic_link_verify: true,
        })
        .await
    }

    /// Resolve a verified email to a principal.
    ///
    /// Finds or creates the user tagged `MAGIC_LINK`, runs the
    /// post-authentication hook, and returns the user's id.
    ///
    /// # Errors
    ///
    /// Errors from the user store or the hook are returned unchanged.
    #[instrument(skip(self, params), fields(magic_link_verify = params.magic_link_verify))]
    pub async fn verify(&self, params: VerifyParams) -> Result<AuthUser> {
        let outcome = self
            .users
            .find_or_create_user(FindOrCreateUser {
                email: params.email,
                authentication_method: AuthenticationMethod::MagicLink,
            })
            .await?;

        debug!(
            user_id = %outcome.user.id,
            is_new_user = outcome.is_new_user,
            "Resolved magic link user"
        );

        let user_id = outcome.user.id;
        self.hook
            .post_authentication(PostAuthenticationContext {
                user: outcome.user,
                is_new_user: outcome.is_new_user,
                login_method: AuthenticationMethod::MagicLink,
            })
            .await?;

        Ok(AuthUser { user_id })
    }
}

#[async_trait]
impl<S, E, U, P> Strategy<S> for EmailLinkStrategy<E, U, P>
where
    S: SessionStore,
    E: EmailProvider + 'static,
    U: UserRepository + 'static,
    P: PostAuthentication + 'static,
{
    fn name(&self) -> &'static str {
        STRATEGY_NAME
    }

    async fn authenticate(
        &self,
        request: StrategyRequest,
        session: SessionHandle<'_, S>,
    ) -> Result<StrategyOutcome> {
        match request {
            StrategyRequest::Submit { form } => self
                .send_link(form, &session)
                .await
                .map(StrategyOutcome::LinkSent),
            StrategyRequest::Callback { token } => self
                .callback(&token, &session)
                .await
                .map(StrategyOutcome::Authenticated),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::constants::SESSION_MAGIC_LINK_KEY;
    use crate::mocks::{MockEmailProvider, MockPostAuthentication, MockUserRepository};
    use crate::state::SessionId;
    use crate::stores::InMemorySessionStore;

    type TestStrategy =
        EmailLinkStrategy<MockEmailProvider, MockUserRepository, MockPostAuthentication>;

    fn strategy(config: MagicLinkConfig) -> (TestStrategy, MockEmailProvider) {
        let email = MockEmailProvider::new();
        let strategy = EmailLinkStrategy::new(
            config,
            email.clone(),
            MockUserRepository::new(),
            MockPostAuthentication::new(),
        );
        (strategy, email)
    }

    fn config() -> MagicLinkConfig {
        MagicLinkConfig::new("test-secret", "http://localhost:3000").unwrap()
    }

    fn form(email: &str) -> Form {
        let mut form = Form::new();
        form.insert(EMAIL_FIELD.to_string(), email.to_string());
        form
    }

    #[tokio::test]
    async fn test_send_link_emails_callback_url_and_stores_token() {
        let (strategy, email) = strategy(config());
        let store = InMemorySessionStore::new();
        let session = SessionHandle::new(&store, SessionId::new());

        let sent = strategy.send_link(form("alice@example.com"), &session).await.unwrap();
        assert_eq!(sent.email, "alice@example.com");

        let link = email.last_link().unwrap();
        assert!(link.starts_with("http://localhost:3000/magic?token="));

        let token = MockEmailProvider::token_from_link(&link).unwrap();
        assert_eq!(session.get(SESSION_MAGIC_LINK_KEY).await.unwrap(), Some(token));
        assert_eq!(
            session.get(SESSION_EMAIL_KEY).await.unwrap(),
            Some("alice@example.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_send_link_requires_email() {
        let (strategy, email) = strategy(config());
        let store = InMemorySessionStore::new();
        let session = SessionHandle::new(&store, SessionId::new());

        let err = strategy.send_link(Form::new(), &session).await.unwrap_err();
        assert_eq!(err.to_string(), "Email is required");

        let err = strategy.send_link(form("nope"), &session).await.unwrap_err();
        assert_eq!(err.to_string(), "Email is not valid");

        assert_eq!(email.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_callback_clears_pending_link() {
        let (strategy, email) = strategy(config());
        let store = InMemorySessionStore::new();
        let session = SessionHandle::new(&store, SessionId::new());

        strategy.send_link(form("alice@example.com"), &session).await.unwrap();
        let token = MockEmailProvider::token_from_link(&email.last_link().unwrap()).unwrap();

        strategy.callback(&token, &session).await.unwrap();
        assert_eq!(session.get(SESSION_MAGIC_LINK_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_callback_in_other_browser_without_session_validation() {
        let (strategy, email) = strategy(config());
        let store = InMemorySessionStore::new();

        let sender = SessionHandle::new(&store, SessionId::new());
        strategy.send_link(form("alice@example.com"), &sender).await.unwrap();
        let token = MockEmailProvider::token_from_link(&email.last_link().unwrap()).unwrap();

        let other = SessionHandle::new(&store, SessionId::new());
        tokio_test::assert_ok!(strategy.callback(&token, &other).await);
    }

    #[tokio::test]
    async fn test_strategy_name() {
        let (strategy, _) = strategy(config());
        assert_eq!(Strategy::<InMemorySessionStore>::name(&strategy), "email-link");
    }
}
