//! # Gateway Core
//!
//! Event intake for the gateway: an HTTP-shaped handler that authenticates
//! a request by API key, validates its JSON body against the custom event
//! schema, and hands the event to an ingestion service.
//!
//! ## Flow
//!
//! ```text
//! IntakeRequest
//!   → method check            (405)
//!   → ApiKeyAuthenticator     (401)
//!   → body read + JSON parse  (PayloadTooLarge / MalformedBody)
//!   → EventEnvelope schema    (422)
//!   → IngestionService        (200)
//! ```
//!
//! The handler knows nothing about any web framework. `gateway-web` adapts
//! it to axum.
//!
//! ## Example
//!
//! ```ignore
//! use gateway_core::*;
//!
//! let handler = EventIntakeHandler::new(
//!     EnvironmentApiKeyAuthenticator::new(environments),
//!     ConsoleIngestionService::new(),
//! );
//!
//! let response = handler
//!     .handle(IntakeRequest::new(Method::POST, headers, body))
//!     .await?;
//! assert_eq!(response.status, StatusCode::OK);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod environment;
pub mod error;
pub mod ingestion;
pub mod intake;
pub mod schema;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use environment::{
    ApiKeyAuthenticator, AuthenticatedEnvironment, EnvironmentApiKeyAuthenticator,
    EnvironmentRepository, InMemoryEnvironmentRepository,
};
pub use error::{IntakeError, Result};
pub use ingestion::{
    ConsoleIngestionService, HttpIngestionService, IngestCustomEvent, IngestionService,
};
pub use intake::{EventIntakeHandler, IntakeBody, IntakeRequest, IntakeResponse, RequestBody};
pub use schema::{CustomEvent, EventEnvelope, Issue, IssueCode, ValidationErrors};
