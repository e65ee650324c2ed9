//! Mock user repository for testing.

use crate::error::{AuthError, Result};
use crate::providers::{FindOrCreateOutcome, FindOrCreateUser, UserRepository};
use crate::stores::InMemoryUserRepository;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock user repository.
///
/// Uses in-memory storage and counts `find_or_create_user` calls.
#[derive(Debug, Clone, Default)]
pub struct MockUserRepository {
    inner: InMemoryUserRepository,
    calls: Arc<AtomicUsize>,
    fail_with: Option<AuthError>,
}

impl MockUserRepository {
    /// Create a new mock user repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository whose `find_or_create_user` always fails.
    #[must_use]
    pub fn failing(error: AuthError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    /// Number of `find_or_create_user` calls.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UserRepository for MockUserRepository {
    fn find_or_create_user(
        &self,
        request: FindOrCreateUser,
    ) -> impl Future<Output = Result<FindOrCreateOutcome>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.clone();
        let fail_with = self.fail_with.clone();

        async move {
            match fail_with {
                Some(error) => Err(error),
                None => inner.find_or_create_user(request).await,
            }
        }
    }
}
