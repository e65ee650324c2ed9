//! Post-authentication hook.
//!
//! Runs after every successful magic-link verification, before the
//! principal is handed back to the caller. A failing hook fails the login.

use crate::error::Result;
use crate::state::{LoginMethod, User};
use tracing::info;

/// What the hook is told about a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostAuthenticationContext {
    /// The authenticated user.
    pub user: User,

    /// `true` if the account was created by this login.
    pub is_new_user: bool,

    /// How the user signed in.
    pub login_method: LoginMethod,
}

/// Side effects to run after authentication.
pub trait PostAuthentication: Send + Sync {
    /// Run the hook.
    ///
    /// # Errors
    ///
    /// Any error is returned to the strategy caller unchanged.
    fn post_authentication(
        &self,
        context: PostAuthenticationContext,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Hook that records logins as structured log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPostAuthentication;

impl LoggingPostAuthentication {
    /// Create the hook.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PostAuthentication for LoggingPostAuthentication {
    async fn post_authentication(&self, context: PostAuthenticationContext) -> Result<()> {
        info!(
            user_id = %context.user.id,
            is_new_user = context.is_new_user,
            login_method = %context.login_method,
            "User authenticated"
        );

        if context.is_new_user {
            info!(user_id = %context.user.id, "New user has no organization yet");
        }

        Ok(())
    }
}
