//! Error types for magic-link authentication.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for the magic-link flow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Link Errors
    // ═══════════════════════════════════════════════════════════

    /// Submitted email is missing or malformed.
    #[error("{reason}")]
    InvalidEmail {
        /// Reason shown to the user
        reason: String,
    },

    /// Magic link token is missing, tampered with, or undecodable.
    #[error("Invalid magic link token")]
    MagicLinkInvalid,

    /// Magic link is older than the configured TTL.
    #[error("Magic link expired. Please request a new one.")]
    MagicLinkExpired,

    /// Magic link does not match the one stored in the session.
    #[error("Magic link does not match")]
    MagicLinkMismatch,

    // ═══════════════════════════════════════════════════════════
    // Registration Errors
    // ═══════════════════════════════════════════════════════════

    /// No strategy is registered under this name.
    #[error("Unknown authentication strategy: {0}")]
    UnknownStrategy(String),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// User store operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Email delivery failed.
    #[error("Email error: {0}")]
    EmailError(String),

    /// Post-authentication hook failed.
    #[error("Post-authentication failed: {0}")]
    HookFailed(String),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    SessionError(String),

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Returns `true` for failures of the link itself (bad input, expired,
    /// tampered, mismatched), as opposed to failures of a collaborator.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gateway_auth::AuthError;
    /// assert!(AuthError::MagicLinkExpired.is_link_error());
    /// assert!(!AuthError::DatabaseError("down".into()).is_link_error());
    /// ```
    #[must_use]
    pub const fn is_link_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail { .. }
                | Self::MagicLinkInvalid
                | Self::MagicLinkExpired
                | Self::MagicLinkMismatch
        )
    }
}

/// Startup configuration errors. Any of these prevents the process from
/// starting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The magic link secret is not set.
    #[error("Missing {0} env variable.")]
    MissingSecret(&'static str),

    /// A variable is set but unusable.
    #[error("Invalid value for {var}: {reason}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// What is wrong with it
        reason: String,
    },
}
