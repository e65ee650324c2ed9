//! Error types for event intake.

use thiserror::Error;

/// Result type alias for intake operations.
pub type Result<T> = std::result::Result<T, IntakeError>;

/// Failures raised by the intake handler and its collaborators.
///
/// Rejections the handler answers itself (405, 401, 422) are *outcomes*,
/// not errors: they come back as an [`IntakeResponse`](crate::IntakeResponse).
/// Everything in this enum is propagated unchanged to the hosting framework.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntakeError {
    /// The request body is not valid JSON, or could not be read.
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// The request body is larger than the accepted limit.
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge {
        /// Limit in bytes.
        limit: usize,
    },

    /// The ingestion service failed to accept the event.
    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    /// An environment / API key lookup failed.
    #[error("Repository error: {0}")]
    Repository(String),

    /// Anything else (should not be exposed to callers).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntakeError {
    /// Returns `true` if the failure was caused by the caller's input.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gateway_core::IntakeError;
    /// assert!(IntakeError::MalformedBody("eof".into()).is_client_error());
    /// assert!(!IntakeError::Ingestion("down".into()).is_client_error());
    /// ```
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::MalformedBody(_) | Self::PayloadTooLarge { .. })
    }
}
