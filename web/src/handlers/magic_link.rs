//! Magic-link sign-in endpoints.
//!
//! ```text
//! POST /login/magic  {email}    → 200 {message, email}, link emailed
//! GET  /magic?token=…           → 303 /              (signed in)
//!                               → 303 /login/magic   (bad or expired link)
//! GET  /login/magic             → 200 {authenticated, error}
//! ```
//!
//! All three respond with the `__session` cookie so the browser keeps the
//! session that holds the pending link and, later, the signed-in user.
//! A rejected link only leaves its error behind on a session the browser
//! already had; a request without a session cookie stores nothing.

use crate::WebResult;
use crate::error::AppError;
use crate::extractors::{ClientIp, SessionCookie};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use gateway_auth::{
    Form, SessionStore, StrategyOutcome, StrategyRequest,
    constants::{EMAIL_FIELD, STRATEGY_NAME},
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Where a successful sign-in lands.
pub const SUCCESS_REDIRECT: &str = "/";

/// Where a rejected link lands.
pub const FAILURE_REDIRECT: &str = "/login/magic";

/// Request body for `POST /login/magic`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMagicLinkRequest {
    /// Address to send the link to.
    pub email: String,
}

/// Response body for `POST /login/magic`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMagicLinkResponse {
    /// Human-readable confirmation.
    pub message: String,
    /// Address the link went to.
    pub email: String,
}

/// Query string of the link callback.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    /// Sealed link token.
    pub token: Option<String>,
}

/// Response body for `GET /login/magic`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginStatus {
    /// Whether this session is signed in.
    pub authenticated: bool,
    /// Last sign-in error, shown once.
    pub error: Option<String>,
}

fn with_session(response: impl IntoResponse, session: &SessionCookie, secure: bool) -> Response {
    (session.jar(secure), response).into_response()
}

/// Email a sign-in link.
///
/// # Errors
///
/// - 422 if the email is missing or malformed
/// - 500 if the email could not be sent
#[instrument(skip_all, fields(client_ip = %client_ip, session_id = %session.id))]
pub async fn send_magic_link<A, I, S>(
    State(state): State<AppState<A, I, S>>,
    session: SessionCookie,
    ClientIp(client_ip): ClientIp,
    Json(request): Json<SendMagicLinkRequest>,
) -> WebResult<Response>
where
    A: Send + Sync + 'static,
    I: Send + Sync + 'static,
    S: SessionStore,
{
    let mut form = Form::new();
    form.insert(EMAIL_FIELD.to_string(), request.email);

    let outcome = state
        .auth
        .authenticate(STRATEGY_NAME, StrategyRequest::Submit { form }, session.id)
        .await?;

    let StrategyOutcome::LinkSent(sent) = outcome else {
        return Err(AppError::internal("Unexpected authentication outcome"));
    };

    counter!("gateway_magic_links_sent_total").increment(1);
    info!("Magic link requested");

    let body = SendMagicLinkResponse {
        message: "Magic link sent. Check your email.".to_string(),
        email: sent.email,
    };
    Ok(with_session(Json(body), &session, state.secure_cookies))
}

/// Complete sign-in from an emailed link.
///
/// Link problems (invalid, expired, mismatched) redirect to
/// [`FAILURE_REDIRECT`], keeping the message in the session if the request
/// arrived with one.
///
/// # Errors
///
/// 500 if the user store, post-authentication hook or session store fails.
#[instrument(skip_all, fields(session_id = %session.id))]
pub async fn magic_link_callback<A, I, S>(
    State(state): State<AppState<A, I, S>>,
    session: SessionCookie,
    Query(query): Query<CallbackQuery>,
) -> WebResult<Response>
where
    A: Send + Sync + 'static,
    I: Send + Sync + 'static,
    S: SessionStore,
{
    let request = StrategyRequest::Callback {
        token: query.token.unwrap_or_default(),
    };

    match state.auth.authenticate(STRATEGY_NAME, request, session.id).await {
        Ok(StrategyOutcome::Authenticated(user)) => {
            counter!("gateway_magic_link_logins_total", "result" => "success").increment(1);
            info!(user_id = %user.user_id, "Signed in with magic link");
            Ok(with_session(
                Redirect::to(SUCCESS_REDIRECT),
                &session,
                state.secure_cookies,
            ))
        }
        Ok(StrategyOutcome::LinkSent(_)) => {
            Err(AppError::internal("Unexpected authentication outcome"))
        }
        Err(error) if error.is_link_error() => {
            counter!("gateway_magic_link_logins_total", "result" => "rejected").increment(1);
            warn!(error = %error, new_session = session.is_new, "Magic link rejected");
            if !session.is_new {
                state.auth.record_error(session.id, &error).await?;
            }
            Ok(with_session(
                Redirect::to(FAILURE_REDIRECT),
                &session,
                state.secure_cookies,
            ))
        }
        Err(error) => Err(error.into()),
    }
}

/// Report sign-in state and the pending error, if any.
///
/// # Errors
///
/// 500 if the session store fails.
pub async fn login_status<A, I, S>(
    State(state): State<AppState<A, I, S>>,
    session: SessionCookie,
) -> WebResult<Response>
where
    A: Send + Sync + 'static,
    I: Send + Sync + 'static,
    S: SessionStore,
{
    let error = state.auth.take_error(session.id).await?;
    let authenticated = state.auth.current_user(session.id).await?.is_some();

    Ok(with_session(
        Json(LoginStatus {
            authenticated,
            error,
        }),
        &session,
        state.secure_cookies,
    ))
}
