//! Mock implementations for testing.
//!
//! Every mock records what it was asked to do and can be switched into a
//! failing mode with a specific [`AuthError`](crate::AuthError).

pub mod email;
pub mod post_auth;
pub mod user;

pub use email::{MockEmailProvider, SentMagicLink};
pub use post_auth::MockPostAuthentication;
pub use user::MockUserRepository;
