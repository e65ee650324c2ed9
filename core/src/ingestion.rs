//! Ingestion service seam.
//!
//! The intake handler validates and authenticates; durably recording and
//! processing the event is the ingestion service's job. Idempotency, if any,
//! is enforced there using the client-supplied `id`.

use crate::error::{IntakeError, Result};
use crate::schema::CustomEvent;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{info, instrument};

/// Request handed to the ingestion service after successful validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestCustomEvent {
    /// Client-supplied idempotency / correlation token.
    pub id: String,

    /// The validated event.
    pub event: CustomEvent,

    /// API key of the authenticated environment.
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

/// Ingestion service.
///
/// Abstracts over whatever records the event (database, queue, upstream
/// service).
pub trait IngestionService: Send + Sync {
    /// Ingest a validated event.
    ///
    /// # Errors
    ///
    /// Returns error if the event could not be accepted. The intake handler
    /// propagates it unchanged.
    fn ingest(&self, request: IngestCustomEvent) -> impl Future<Output = Result<()>> + Send;
}

/// Console ingestion service for development.
///
/// Logs the event instead of recording it.
#[derive(Clone, Debug, Default)]
pub struct ConsoleIngestionService;

impl ConsoleIngestionService {
    /// Create a new console ingestion service.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl IngestionService for ConsoleIngestionService {
    async fn ingest(&self, request: IngestCustomEvent) -> Result<()> {
        info!(
            id = %request.id,
            name = %request.event.name,
            payload = %request.event.payload,
            "📥 Custom event ingested (Development Mode)"
        );
        Ok(())
    }
}

/// Forwards events to an upstream ingestion endpoint over HTTP.
///
/// The request is posted as JSON with the environment's API key as a bearer
/// token. Any non-2xx response is an ingestion failure.
#[derive(Clone, Debug)]
pub struct HttpIngestionService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpIngestionService {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a service posting to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| IntakeError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, endpoint))
    }

    /// Create a service with a preconfigured client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Upstream endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl IngestionService for HttpIngestionService {
    #[instrument(name = "ingest_upstream", skip_all, fields(id = %request.id, endpoint = %self.endpoint))]
    async fn ingest(&self, request: IngestCustomEvent) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&request.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| IntakeError::Ingestion(format!("Upstream request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IntakeError::Ingestion(format!(
                "Upstream returned {status}"
            )));
        }

        info!(status = %status, "Event forwarded upstream");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ingest_request_wire_format() {
        let request = IngestCustomEvent {
            id: "evt_1".to_string(),
            event: CustomEvent {
                name: "x".to_string(),
                payload: json!({}),
                context: None,
                timestamp: None,
            },
            api_key: "tr_dev_123".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "id": "evt_1", "event": { "name": "x", "payload": {} }, "apiKey": "tr_dev_123" })
        );
    }

    #[tokio::test]
    async fn test_console_ingestion_succeeds() {
        let service = ConsoleIngestionService::new();
        let request = IngestCustomEvent {
            id: "evt_1".to_string(),
            event: CustomEvent {
                name: "x".to_string(),
                payload: json!(null),
                context: None,
                timestamp: None,
            },
            api_key: "k".to_string(),
        };
        tokio_test::assert_ok!(service.ingest(request).await);
    }

    #[tokio::test]
    async fn test_http_ingestion_connection_failure_is_ingestion_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let service = HttpIngestionService::new("http://127.0.0.1:9/ingest").unwrap();
        let request = IngestCustomEvent {
            id: "evt_1".to_string(),
            event: CustomEvent {
                name: "x".to_string(),
                payload: json!({}),
                context: None,
                timestamp: None,
            },
            api_key: "k".to_string(),
        };

        let err = service.ingest(request).await.unwrap_err();
        assert!(matches!(err, IntakeError::Ingestion(_)));
    }
}
