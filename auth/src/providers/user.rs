//! User repository trait.

use crate::error::Result;
use crate::state::{AuthenticationMethod, User};

/// Request to look up a user by email, creating the account if absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOrCreateUser {
    /// Email address (any case).
    pub email: String,

    /// Method to tag a newly created account with.
    pub authentication_method: AuthenticationMethod,
}

/// Result of [`UserRepository::find_or_create_user`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOrCreateOutcome {
    /// The found or created user.
    pub user: User,

    /// `true` if this call created the account.
    pub is_new_user: bool,
}

/// User repository.
pub trait UserRepository: Send + Sync {
    /// Find a user by email or create one.
    ///
    /// Idempotent: calling twice with the same email yields the same user,
    /// with `is_new_user` set only on the first call.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DatabaseError`](crate::AuthError::DatabaseError)
    /// if the store fails.
    fn find_or_create_user(
        &self,
        request: FindOrCreateUser,
    ) -> impl std::future::Future<Output = Result<FindOrCreateOutcome>> + Send;
}
