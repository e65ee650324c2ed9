//! Authentication providers.
//!
//! Traits for every external dependency of the magic-link flow. The
//! strategy depends on these traits; the server wires concrete
//! implementations.
//!
//! - **Testing**: mocks from [`crate::mocks`] (in-memory, deterministic)
//! - **Development**: [`ConsoleEmailProvider`], [`LoggingPostAuthentication`]
//! - **Production**: [`SmtpEmailProvider`] and real stores

pub mod console_email;
pub mod email;
pub mod post_auth;
pub mod session;
pub mod smtp_email;
pub mod user;

pub use console_email::ConsoleEmailProvider;
pub use email::EmailProvider;
pub use post_auth::{LoggingPostAuthentication, PostAuthentication, PostAuthenticationContext};
pub use session::SessionStore;
pub use smtp_email::{SmtpEmailProvider, SmtpSettings};
pub use user::{FindOrCreateOutcome, FindOrCreateUser, UserRepository};
