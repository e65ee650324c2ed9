//! Mock API key authenticator for testing.

use crate::environment::{
    extract_api_key, ApiKeyAuthenticator, AuthenticatedEnvironment, EnvironmentId, OrganizationId,
};
use crate::error::{IntakeError, Result};
use http::HeaderMap;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock authenticator.
///
/// Accepts bearer keys registered with [`with_key`](Self::with_key) and counts
/// every call.
#[derive(Debug, Clone, Default)]
pub struct MockApiKeyAuthenticator {
    keys: Arc<Mutex<HashMap<String, AuthenticatedEnvironment>>>,
    calls: Arc<AtomicUsize>,
    fail_with: Option<IntakeError>,
}

impl MockApiKeyAuthenticator {
    /// Create an authenticator that knows no keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a valid key.
    #[must_use]
    pub fn with_key(self, api_key: &str) -> Self {
        if let Ok(mut keys) = self.keys.lock() {
            keys.insert(
                api_key.to_string(),
                AuthenticatedEnvironment {
                    environment_id: EnvironmentId::new(),
                    organization_id: OrganizationId::new(),
                    slug: "dev".to_string(),
                    api_key: api_key.to_string(),
                },
            );
        }
        self
    }

    /// Make every lookup fail with `error`.
    #[must_use]
    pub fn failing(mut self, error: IntakeError) -> Self {
        self.fail_with = Some(error);
        self
    }

    /// Number of `authenticate` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ApiKeyAuthenticator for MockApiKeyAuthenticator {
    fn authenticate(
        &self,
        headers: &HeaderMap,
    ) -> impl Future<Output = Result<Option<AuthenticatedEnvironment>>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let keys = Arc::clone(&self.keys);
        let api_key = extract_api_key(headers).map(str::to_string);
        let fail_with = self.fail_with.clone();

        async move {
            if let Some(error) = fail_with {
                return Err(error);
            }
            let Some(api_key) = api_key else {
                return Ok(None);
            };
            Ok(keys
                .lock()
                .map_err(|_| IntakeError::Internal("mock lock poisoned".to_string()))?
                .get(&api_key)
                .cloned())
        }
    }
}
