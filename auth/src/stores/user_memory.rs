//! In-memory user repository.

use crate::error::{AuthError, Result};
use crate::providers::{FindOrCreateOutcome, FindOrCreateUser, UserRepository};
use crate::state::{User, UserId};
use crate::utils::normalize_email;
use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Default)]
struct Users {
    by_id: HashMap<UserId, User>,
    by_email: HashMap<String, UserId>,
}

/// User repository backed by a process-local map.
///
/// Emails are normalized to lowercase, so `Alice@Example.com` and
/// `alice@example.com` are the same account.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<Users>>,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self
            .users
            .lock()
            .map_err(|_| AuthError::InternalError("user store lock poisoned".to_string()))?
            .by_id
            .len())
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find_or_create_user(
        &self,
        request: FindOrCreateUser,
    ) -> impl Future<Output = Result<FindOrCreateOutcome>> + Send {
        let users = Arc::clone(&self.users);

        async move {
            let email = normalize_email(&request.email);
            let mut guard = users
                .lock()
                .map_err(|_| AuthError::DatabaseError("user store lock poisoned".to_string()))?;

            if let Some(user) = guard
                .by_email
                .get(&email)
                .and_then(|id| guard.by_id.get(id))
            {
                return Ok(FindOrCreateOutcome {
                    user: user.clone(),
                    is_new_user: false,
                });
            }

            let now = Utc::now();
            let user = User {
                id: UserId::new(),
                email: email.clone(),
                name: None,
                authentication_method: request.authentication_method,
                created_at: now,
                updated_at: now,
            };
            guard.by_email.insert(email, user.id);
            guard.by_id.insert(user.id, user.clone());
            debug!(user_id = %user.id, "Created user");

            Ok(FindOrCreateOutcome {
                user,
                is_new_user: true,
            })
        }
    }
}
