//! Axum routes for event intake and magic-link sign-in.
//!
//! The domain crates know nothing about HTTP frameworks; this crate is the
//! thin shell that adapts Axum requests to them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← routing, cookies, redirects
//! │  - Request extraction                   │  ← correlation ids, tracing
//! │  - Response mapping                     │  ← metrics
//! ├─────────────────────────────────────────┤
//! │  gateway-core        gateway-auth       │
//! │  EventIntakeHandler  Authenticator      │  ← framework independent
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use gateway_web::{AppState, router};
//!
//! let state = AppState::new(intake, authenticator, "/magic");
//! let app = router(state);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ClientIp, CorrelationId, SESSION_COOKIE, SessionCookie};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use router::{EVENTS_PATH, LOGIN_PATH, MAX_BODY_BYTES, router};
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
