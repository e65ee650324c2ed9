//! Authentication strategies.
//!
//! A strategy turns one request (a form submission or a link callback)
//! into an outcome, reading and writing the caller's session as it goes.
//! Strategies are registered by name on an
//! [`Authenticator`](crate::Authenticator).

pub mod email_link;

pub use email_link::{EmailLinkStrategy, MagicLinkSent, VerifyParams};

use crate::error::Result;
use crate::providers::SessionStore;
use crate::state::{AuthUser, Form, SessionId};
use async_trait::async_trait;

/// Input to a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyRequest {
    /// A login form was submitted.
    Submit {
        /// Submitted fields.
        form: Form,
    },

    /// The user followed a link back to the application.
    Callback {
        /// Token from the link.
        token: String,
    },
}

/// What a strategy produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// A link was emailed; the user is not signed in yet.
    LinkSent(MagicLinkSent),

    /// The user is signed in.
    Authenticated(AuthUser),
}

/// A session store bound to one session.
#[derive(Debug)]
pub struct SessionHandle<'a, S> {
    store: &'a S,
    id: SessionId,
}

impl<'a, S: SessionStore> SessionHandle<'a, S> {
    /// Bind `store` to session `id`.
    #[must_use]
    pub const fn new(store: &'a S, id: SessionId) -> Self {
        Self { store, id }
    }

    /// Session id.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.store.get(self.id, key).await
    }

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn set(&self, key: &str, value: String) -> Result<()> {
        self.store.set(self.id, key, value).await
    }

    /// Remove a value.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn remove(&self, key: &str) -> Result<Option<String>> {
        self.store.remove(self.id, key).await
    }
}

/// An authentication strategy.
///
/// Object safe so strategies of different concrete types can share one
/// registry.
#[async_trait]
pub trait Strategy<S: SessionStore>: Send + Sync {
    /// Name the strategy is registered under.
    fn name(&self) -> &'static str;

    /// Handle one request.
    ///
    /// # Errors
    ///
    /// Returns the strategy's error unchanged.
    async fn authenticate(
        &self,
        request: StrategyRequest,
        session: SessionHandle<'_, S>,
    ) -> Result<StrategyOutcome>;
}
