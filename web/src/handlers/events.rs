//! Event intake endpoint.
//!
//! Adapts Axum requests to the framework-independent
//! [`EventIntakeHandler`](gateway_core::EventIntakeHandler).
//!
//! # Endpoint
//!
//! ```text
//! ANY /api/v1/events
//! Authorization: Bearer <api key>
//!
//! { "id": "evt_1", "event": { "name": "x", "payload": {} } }
//! ```
//!
//! The body is handed over unread as a [`LimitedBody`]; it is only buffered
//! after the method and API key checks pass, and never beyond
//! [`MAX_BODY_BYTES`](crate::router::MAX_BODY_BYTES).

use crate::WebResult;
use crate::error::AppError;
use crate::extractors::CorrelationId;
use crate::router::MAX_BODY_BYTES;
use crate::state::AppState;
use axum::{
    Json,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
};
use gateway_auth::SessionStore;
use gateway_core::{
    ApiKeyAuthenticator, IngestionService, IntakeBody, IntakeError, IntakeRequest,
    IntakeResponse, RequestBody,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use metrics::counter;
use tracing::instrument;

/// An unread Axum body with a size cap.
#[derive(Debug)]
pub struct LimitedBody {
    body: Body,
    limit: usize,
}

impl LimitedBody {
    /// Wrap `body`, refusing to buffer more than `limit` bytes.
    #[must_use]
    pub const fn new(body: Body, limit: usize) -> Self {
        Self { body, limit }
    }
}

impl RequestBody for LimitedBody {
    async fn read(self) -> gateway_core::Result<Bytes> {
        let limit = self.limit;
        match Limited::new(self.body, limit).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(e) if e.is::<LengthLimitError>() => Err(IntakeError::PayloadTooLarge { limit }),
            Err(e) => Err(IntakeError::MalformedBody(e.to_string())),
        }
    }
}

/// Run the intake pipeline for one request.
///
/// Every method is routed here; the handler itself answers 405 for
/// anything but POST.
///
/// # Errors
///
/// - 400 if the body is not JSON
/// - 413 if the body is larger than [`MAX_BODY_BYTES`]
/// - 500 if the authenticator or ingestion service fails
#[instrument(skip_all, fields(correlation_id = %correlation_id.0, method = %method))]
pub async fn ingest_event<A, I, S>(
    State(state): State<AppState<A, I, S>>,
    correlation_id: CorrelationId,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> WebResult<Response>
where
    A: ApiKeyAuthenticator + 'static,
    I: IngestionService + 'static,
    S: SessionStore,
{
    let request = IntakeRequest::new(method, headers, LimitedBody::new(body, MAX_BODY_BYTES));
    let result = state.intake.handle(request).await.map_err(AppError::from);

    let status = match &result {
        Ok(response) => response.status,
        Err(error) => error.status(),
    };
    counter!("gateway_intake_requests_total", "status" => status.as_u16().to_string())
        .increment(1);

    Ok(into_http(result?))
}

fn into_http(response: IntakeResponse) -> Response {
    match response.body {
        IntakeBody::Empty => response.status.into_response(),
        IntakeBody::Text(text) => (response.status, text).into_response(),
        IntakeBody::Json(value) => (response.status, Json(value)).into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::{StatusCode, header};
    use serde_json::json;

    #[test]
    fn test_text_body_is_plain_text() {
        let response = into_http(IntakeResponse::method_not_allowed());
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
    }

    #[test]
    fn test_json_body_is_json() {
        let response = into_http(IntakeResponse {
            status: StatusCode::UNAUTHORIZED,
            body: IntakeBody::Json(json!({ "error": "nope" })),
        });
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_limited_body_reads_within_limit() {
        let body = LimitedBody::new(Body::from("{\"id\":1}"), 64);
        assert_eq!(body.read().await.unwrap(), Bytes::from_static(b"{\"id\":1}"));
    }

    #[tokio::test]
    async fn test_limited_body_refuses_oversized_body() {
        let body = LimitedBody::new(Body::from(vec![b'a'; 65]), 64);
        assert_eq!(
            body.read().await.unwrap_err(),
            IntakeError::PayloadTooLarge { limit: 64 }
        );
    }

    #[test]
    fn test_empty_body_has_no_content_type() {
        let response = into_http(IntakeResponse::accepted());
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }
}
