//! Mock post-authentication hook for testing.

use crate::error::{AuthError, Result};
use crate::providers::{PostAuthentication, PostAuthenticationContext};
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Mock post-authentication hook.
///
/// Records every context it is called with.
#[derive(Debug, Clone, Default)]
pub struct MockPostAuthentication {
    calls: Arc<Mutex<Vec<PostAuthenticationContext>>>,
    fail_with: Option<AuthError>,
}

impl MockPostAuthentication {
    /// Create a hook that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hook that records the call and then fails with `error`.
    #[must_use]
    pub fn failing(error: AuthError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    /// Contexts received, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<PostAuthenticationContext> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl PostAuthentication for MockPostAuthentication {
    fn post_authentication(
        &self,
        context: PostAuthenticationContext,
    ) -> impl Future<Output = Result<()>> + Send {
        let calls = Arc::clone(&self.calls);
        let fail_with = self.fail_with.clone();

        async move {
            calls
                .lock()
                .map_err(|_| AuthError::InternalError("mock lock poisoned".to_string()))?
                .push(context);
            fail_with.map_or(Ok(()), Err)
        }
    }
}
