//! Route table.

use crate::handlers::{
    health_check, ingest_event, login_status, magic_link_callback, send_magic_link,
};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{any, get},
};
use gateway_auth::SessionStore;
use gateway_core::{ApiKeyAuthenticator, IngestionService};
use tower_http::trace::TraceLayer;

/// Largest accepted request body.
///
/// JSON extractors enforce it through [`DefaultBodyLimit`]; the intake
/// endpoint enforces it itself once the request is authenticated.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Path of the event intake endpoint.
pub const EVENTS_PATH: &str = "/api/v1/events";

/// Path of the magic-link request endpoint.
pub const LOGIN_PATH: &str = "/login/magic";

/// Build the application router.
///
/// | method | path               | handler                 |
/// |--------|--------------------|-------------------------|
/// | any    | `/api/v1/events`   | [`ingest_event`]        |
/// | POST   | `/login/magic`     | [`send_magic_link`]     |
/// | GET    | `/login/magic`     | [`login_status`]        |
/// | GET    | callback path      | [`magic_link_callback`] |
/// | GET    | `/health`          | [`health_check`]        |
pub fn router<A, I, S>(state: AppState<A, I, S>) -> Router
where
    A: ApiKeyAuthenticator + 'static,
    I: IngestionService + 'static,
    S: SessionStore,
{
    let callback_path = state.callback_path.clone();

    Router::new()
        .route("/health", get(health_check))
        .route(EVENTS_PATH, any(ingest_event::<A, I, S>))
        .route(
            LOGIN_PATH,
            get(login_status::<A, I, S>).post(send_magic_link::<A, I, S>),
        )
        .route(&callback_path, get(magic_link_callback::<A, I, S>))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
