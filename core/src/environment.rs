//! API key authentication.
//!
//! An API key maps a request to an account / environment context. The
//! context is resolved per request and discarded once the request is done.

use crate::error::{IntakeError, Result};
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Unique identifier for a runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentId(pub Uuid);

impl EnvironmentId {
    /// Generate a new random `EnvironmentId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EnvironmentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationId(pub Uuid);

impl OrganizationId {
    /// Generate a new random `OrganizationId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrganizationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment context associated with a request via its API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedEnvironment {
    /// Environment ID.
    pub environment_id: EnvironmentId,

    /// Owning organization.
    pub organization_id: OrganizationId,

    /// Human-readable environment slug (e.g. `"dev"`, `"prod"`).
    pub slug: String,

    /// The API key the request authenticated with.
    pub api_key: String,
}

/// Authenticates raw intake requests.
///
/// Only the headers are available: the body has not been read yet.
pub trait ApiKeyAuthenticator: Send + Sync {
    /// Resolve the environment a request belongs to.
    ///
    /// Returns `Ok(None)` when the key is missing or unknown.
    ///
    /// # Errors
    ///
    /// Returns error if the backing lookup fails.
    fn authenticate(
        &self,
        headers: &HeaderMap,
    ) -> impl Future<Output = Result<Option<AuthenticatedEnvironment>>> + Send;
}

/// Environment lookup by API key.
pub trait EnvironmentRepository: Send + Sync {
    /// Find the environment owning `api_key`.
    ///
    /// # Errors
    ///
    /// Returns error if the lookup fails.
    fn find_by_api_key(
        &self,
        api_key: &str,
    ) -> impl Future<Output = Result<Option<AuthenticatedEnvironment>>> + Send;
}

/// Extracts the API key from an `Authorization: Bearer <key>` header.
///
/// # Examples
///
/// ```
/// # use gateway_core::environment::extract_api_key;
/// # use http::{HeaderMap, HeaderValue};
/// let mut headers = HeaderMap::new();
/// headers.insert("authorization", HeaderValue::from_static("Bearer tr_dev_123"));
/// assert_eq!(extract_api_key(&headers), Some("tr_dev_123"));
/// ```
#[must_use]
pub fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

/// Bearer-token authenticator backed by an [`EnvironmentRepository`].
#[derive(Debug, Clone)]
pub struct EnvironmentApiKeyAuthenticator<R> {
    environments: R,
}

impl<R> EnvironmentApiKeyAuthenticator<R> {
    /// Create an authenticator over `environments`.
    #[must_use]
    pub const fn new(environments: R) -> Self {
        Self { environments }
    }
}

impl<R: EnvironmentRepository> ApiKeyAuthenticator for EnvironmentApiKeyAuthenticator<R> {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Option<AuthenticatedEnvironment>> {
        let Some(api_key) = extract_api_key(headers) else {
            tracing::debug!("Missing or malformed Authorization header");
            return Ok(None);
        };

        let environment = self.environments.find_by_api_key(api_key).await?;

        if let Some(env) = &environment {
            tracing::debug!(
                environment_id = %env.environment_id.0,
                slug = %env.slug,
                "API key authenticated"
            );
        } else {
            tracing::warn!("Unknown API key");
        }

        Ok(environment)
    }
}

fn poisoned() -> IntakeError {
    IntakeError::Repository("environment lock poisoned".to_string())
}

/// In-memory environment repository.
///
/// Seeded at startup; suitable for development and single-node deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEnvironmentRepository {
    by_key: Arc<RwLock<HashMap<String, AuthenticatedEnvironment>>>,
}

impl InMemoryEnvironmentRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an environment under `api_key`, returning its context.
    ///
    /// # Errors
    ///
    /// Returns error if the internal lock is poisoned.
    pub fn insert(&self, api_key: &str, slug: &str) -> Result<AuthenticatedEnvironment> {
        let environment = AuthenticatedEnvironment {
            environment_id: EnvironmentId::new(),
            organization_id: OrganizationId::new(),
            slug: slug.to_string(),
            api_key: api_key.to_string(),
        };

        self.by_key
            .write()
            .map_err(|_| poisoned())?
            .insert(api_key.to_string(), environment.clone());

        Ok(environment)
    }

    /// Parse `key=slug` pairs separated by commas (e.g. `API_KEYS`).
    ///
    /// Entries without a slug default to `"dev"`. Blank entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the internal lock is poisoned.
    pub fn from_pairs(pairs: &str) -> Result<Self> {
        let repo = Self::new();
        for entry in pairs.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, slug) = entry.split_once('=').unwrap_or((entry, "dev"));
            repo.insert(key.trim(), slug.trim())?;
        }
        Ok(repo)
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.read().map(|m| m.len()).unwrap_or(0)
    }

    /// `true` if no keys are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EnvironmentRepository for InMemoryEnvironmentRepository {
    fn find_by_api_key(
        &self,
        api_key: &str,
    ) -> impl Future<Output = Result<Option<AuthenticatedEnvironment>>> + Send {
        let by_key = Arc::clone(&self.by_key);
        let api_key = api_key.to_string();

        async move {
            Ok(by_key
                .read()
                .map_err(|_| poisoned())?
                .get(&api_key)
                .cloned())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn request_with_auth(value: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert("authorization", HeaderValue::from_static(value));
        }
        headers
    }

    struct UnreachableRepository;

    impl EnvironmentRepository for UnreachableRepository {
        async fn find_by_api_key(&self, _api_key: &str) -> Result<Option<AuthenticatedEnvironment>> {
            Err(IntakeError::Repository("connection refused".to_string()))
        }
    }

    #[test]
    fn test_extract_api_key_from_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer test-api-key-12345"));
        assert_eq!(extract_api_key(&headers), Some("test-api-key-12345"));
    }

    #[test]
    fn test_extract_api_key_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_api_key(&headers), None);
    }

    #[test]
    fn test_extract_api_key_rejects_empty_key() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_api_key(&headers), None);
    }

    #[test]
    fn test_extract_api_key_returns_none_without_auth_header() {
        assert_eq!(extract_api_key(&HeaderMap::new()), None);
    }

    #[test]
    fn test_from_pairs() {
        let repo = InMemoryEnvironmentRepository::from_pairs("key_a=prod, key_b ,,").unwrap();
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn test_authenticates_known_key() {
        let repo = InMemoryEnvironmentRepository::new();
        let expected = repo.insert("tr_dev_123", "dev").unwrap();
        let auth = EnvironmentApiKeyAuthenticator::new(repo);

        let env = auth
            .authenticate(&request_with_auth(Some("Bearer tr_dev_123")))
            .await
            .unwrap();

        assert_eq!(env, Some(expected));
    }

    #[tokio::test]
    async fn test_unknown_key_is_none() {
        let repo = InMemoryEnvironmentRepository::new();
        repo.insert("tr_dev_123", "dev").unwrap();
        let auth = EnvironmentApiKeyAuthenticator::new(repo);

        let env = auth
            .authenticate(&request_with_auth(Some("Bearer tr_dev_999")))
            .await
            .unwrap();
        assert!(env.is_none());
    }

    #[tokio::test]
    async fn test_missing_header_is_none() {
        let auth = EnvironmentApiKeyAuthenticator::new(InMemoryEnvironmentRepository::new());
        let env = auth.authenticate(&request_with_auth(None)).await.unwrap();
        assert!(env.is_none());
    }

    #[tokio::test]
    async fn test_repository_failure_propagates() {
        let auth = EnvironmentApiKeyAuthenticator::new(UnreachableRepository);
        let err = auth
            .authenticate(&request_with_auth(Some("Bearer tr_dev_123")))
            .await
            .unwrap_err();
        assert_eq!(err, IntakeError::Repository("connection refused".to_string()));
    }
}
