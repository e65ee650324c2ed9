//! Framework-independent event intake handler.
//!
//! # Contract
//!
//! ```text
//! POST /api/v1/events
//! Authorization: Bearer <api key>
//! Content-Type: application/json
//!
//! { "id": "evt_1", "event": { "name": "x", "payload": {} } }
//! ```
//!
//! | outcome                     | status | body                          |
//! |-----------------------------|--------|-------------------------------|
//! | accepted                    | 200    | empty                         |
//! | missing / unknown API key   | 401    | `{"error": "..."}`            |
//! | method other than POST      | 405    | `Method Not Allowed`          |
//! | schema violation            | 422    | `{"error": "<all issues>"}`   |
//!
//! Steps run strictly in order: method check, authentication, body read and
//! parse, validation, ingestion. The body is a [`RequestBody`] that is only
//! read once the method and API key have been accepted, so rejected requests
//! never pay for their payload.

use crate::environment::ApiKeyAuthenticator;
use crate::error::{IntakeError, Result};
use crate::ingestion::{IngestCustomEvent, IngestionService};
use crate::schema::EventEnvelope;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde_json::{json, Value};
use std::future::Future;
use tracing::{debug, info, instrument, warn};

/// 401 message.
pub const UNAUTHORIZED_MESSAGE: &str = "Invalid or Missing API key";

/// 405 body.
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method Not Allowed";

/// A request body that has not been read yet.
pub trait RequestBody: Send {
    /// Read the whole body.
    ///
    /// # Errors
    ///
    /// - [`IntakeError::PayloadTooLarge`] if the body exceeds the reader's limit
    /// - [`IntakeError::MalformedBody`] if the body cannot be read
    fn read(self) -> impl Future<Output = Result<Bytes>> + Send;
}

impl RequestBody for Bytes {
    async fn read(self) -> Result<Bytes> {
        Ok(self)
    }
}

/// An inbound request, stripped of framework specifics.
#[derive(Debug, Clone)]
pub struct IntakeRequest<B = Bytes> {
    /// Request method.
    pub method: Method,
    /// Request headers.
    pub headers: HeaderMap,
    /// Unread request body.
    pub body: B,
}

impl<B> IntakeRequest<B> {
    /// Build a request.
    #[must_use]
    pub const fn new(method: Method, headers: HeaderMap, body: B) -> Self {
        Self {
            method,
            headers,
            body,
        }
    }
}

/// Response body.
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeBody {
    /// No body.
    Empty,
    /// Plain text.
    Text(&'static str),
    /// JSON document.
    Json(Value),
}

/// Handler outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response body.
    pub body: IntakeBody,
}

impl IntakeResponse {
    /// 200 with an empty body.
    #[must_use]
    pub const fn accepted() -> Self {
        Self {
            status: StatusCode::OK,
            body: IntakeBody::Empty,
        }
    }

    /// 405 with a plain-text body.
    #[must_use]
    pub const fn method_not_allowed() -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            body: IntakeBody::Text(METHOD_NOT_ALLOWED_MESSAGE),
        }
    }

    /// 401 with `{"error": ...}`.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::error(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE)
    }

    /// 422 with `{"error": ...}`.
    #[must_use]
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::error(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: IntakeBody::Json(json!({ "error": message.into() })),
        }
    }

    /// The `error` message of a JSON error body, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.body {
            IntakeBody::Json(value) => value.get("error").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Validates inbound events and forwards them for ingestion.
#[derive(Debug, Clone)]
pub struct EventIntakeHandler<A, I> {
    authenticator: A,
    ingestion: I,
}

impl<A, I> EventIntakeHandler<A, I>
where
    A: ApiKeyAuthenticator,
    I: IngestionService,
{
    /// Create a handler from its collaborators.
    #[must_use]
    pub const fn new(authenticator: A, ingestion: I) -> Self {
        Self {
            authenticator,
            ingestion,
        }
    }

    /// Handle one intake request.
    ///
    /// # Errors
    ///
    /// - [`IntakeError::MalformedBody`] if the body is not JSON
    /// - [`IntakeError::PayloadTooLarge`] if the body reader refuses it
    /// - any error raised by the authenticator or the ingestion service,
    ///   unchanged
    #[instrument(name = "event_intake", skip_all, fields(method = %request.method))]
    pub async fn handle<B: RequestBody>(&self, request: IntakeRequest<B>) -> Result<IntakeResponse> {
        if !request.method.as_str().eq_ignore_ascii_case("POST") {
            debug!("Rejecting non-POST request");
            return Ok(IntakeResponse::method_not_allowed());
        }

        let Some(environment) = self.authenticator.authenticate(&request.headers).await? else {
            warn!("Rejecting request with invalid or missing API key");
            return Ok(IntakeResponse::unauthorized());
        };

        let raw = request.body.read().await?;
        let body: Value = serde_json::from_slice(&raw)
            .map_err(|e| IntakeError::MalformedBody(e.to_string()))?;

        let envelope = match EventEnvelope::from_json(&body) {
            Ok(envelope) => envelope,
            Err(errors) => {
                warn!(issues = errors.issues().len(), "Event body failed validation");
                return Ok(IntakeResponse::unprocessable(errors.to_string()));
            }
        };

        let event_id = envelope.id.clone();
        self.ingestion
            .ingest(IngestCustomEvent {
                id: envelope.id,
                event: envelope.event,
                api_key: environment.api_key,
            })
            .await?;

        info!(
            event_id = %event_id,
            environment_id = %environment.environment_id.0,
            "Event accepted"
        );

        Ok(IntakeResponse::accepted())
    }
}
