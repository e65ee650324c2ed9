//! # Gateway Authentication
//!
//! Passwordless magic-link sign-in.
//!
//! ## Features
//!
//! - **Fail-fast configuration**: the link secret is validated at startup
//! - **Sealed links**: AES-256-GCM tokens carrying email, form and issue time
//! - **Pluggable collaborators**: email delivery, user store, session store
//!   and post-authentication hook are traits
//! - **Testable**: mocks for every collaborator (`test-utils` feature)
//!
//! ## Architecture
//!
//! ```text
//! Authenticator ──"email-link"──► EmailLinkStrategy
//!      │                              ├── EmailProvider
//!      ▼                              ├── UserRepository
//! SessionStore                        └── PostAuthentication
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use gateway_auth::*;
//!
//! let config = MagicLinkConfig::from_env()?;
//! let mut authenticator = Authenticator::new(InMemorySessionStore::new());
//! register_email_link_strategy(
//!     &mut authenticator,
//!     config,
//!     ConsoleEmailProvider::new(),
//!     InMemoryUserRepository::new(),
//!     LoggingPostAuthentication::new(),
//! );
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod authenticator;
pub mod config;
pub mod constants;
pub mod error;
pub mod providers;
pub mod seal;
pub mod state;
pub mod stores;
pub mod strategies;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use authenticator::{Authenticator, register_email_link_strategy};
pub use config::{MagicLinkConfig, MagicLinkSecret};
pub use error::{AuthError, ConfigError, Result};
pub use providers::{
    ConsoleEmailProvider, EmailProvider, FindOrCreateOutcome, FindOrCreateUser,
    LoggingPostAuthentication, PostAuthentication, PostAuthenticationContext, SessionStore,
    SmtpEmailProvider, SmtpSettings, UserRepository,
};
pub use state::{AuthUser, AuthenticationMethod, Form, LoginMethod, SessionId, User, UserId};
pub use stores::{InMemorySessionStore, InMemoryUserRepository};
pub use strategies::{
    EmailLinkStrategy, MagicLinkSent, SessionHandle, Strategy, StrategyOutcome, StrategyRequest,
    VerifyParams,
};
