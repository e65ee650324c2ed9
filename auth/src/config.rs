//! Magic-link configuration.
//!
//! Built once at startup and handed to the strategy constructor. A missing
//! secret is a startup error, never a request-time one.

use crate::constants::{
    CALLBACK_PATH, DEFAULT_LINK_TTL_MINUTES, MAGIC_LINK_SECRET_VAR, SESSION_MAGIC_LINK_KEY,
};
use crate::error::ConfigError;
use chrono::Duration;
use std::fmt;

/// Secret used to seal and open magic links.
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct MagicLinkSecret(String);

impl MagicLinkSecret {
    /// Wrap a secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] if `secret` is empty or blank.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret(MAGIC_LINK_SECRET_VAR));
        }
        Ok(Self(secret))
    }

    /// Raw secret bytes.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for MagicLinkSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MagicLinkSecret(***)")
    }
}

/// Magic Link authentication configuration.
#[derive(Debug, Clone)]
pub struct MagicLinkConfig {
    /// Secret for sealing links.
    pub secret: MagicLinkSecret,

    /// Base URL for link generation (e.g. "https://app.example.com").
    ///
    /// Links are formatted as `{base_url}{callback_path}?token={token}`.
    pub base_url: String,

    /// Path the link points at. Default: `/magic`.
    pub callback_path: String,

    /// Session key the pending link is stored under.
    pub session_magic_link_key: String,

    /// How long a link stays valid. Default: 30 minutes.
    pub link_ttl: Duration,

    /// Require the clicked link to match the one stored in the session.
    ///
    /// Default: `false` (links may be opened in another browser).
    pub validate_session_magic_link: bool,
}

impl MagicLinkConfig {
    /// Create a configuration with default path, session key and TTL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] if `secret` is empty.
    pub fn new(secret: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            secret: MagicLinkSecret::new(secret)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            callback_path: CALLBACK_PATH.to_string(),
            session_magic_link_key: SESSION_MAGIC_LINK_KEY.to_string(),
            link_ttl: Duration::minutes(DEFAULT_LINK_TTL_MINUTES),
            validate_session_magic_link: false,
        })
    }

    /// Load from process environment variables.
    ///
    /// | variable                      | required | default                 |
    /// |-------------------------------|----------|-------------------------|
    /// | `MAGIC_LINK_SECRET`           | yes      |                         |
    /// | `APP_ORIGIN`                  | no       | `http://localhost:3000` |
    /// | `MAGIC_LINK_TTL_MINUTES`      | no       | `30`                    |
    /// | `MAGIC_LINK_VALIDATE_SESSION` | no       | `false`                 |
    ///
    /// # Errors
    ///
    /// Returns error if the secret is missing or a value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = lookup(MAGIC_LINK_SECRET_VAR)
            .ok_or(ConfigError::MissingSecret(MAGIC_LINK_SECRET_VAR))?;
        let base_url =
            lookup("APP_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        let mut config = Self::new(secret, base_url)?;

        if let Some(raw) = lookup("MAGIC_LINK_TTL_MINUTES") {
            let minutes: i64 = raw.parse().map_err(|e| ConfigError::Invalid {
                var: "MAGIC_LINK_TTL_MINUTES",
                reason: format!("{e}"),
            })?;
            if minutes <= 0 {
                return Err(ConfigError::Invalid {
                    var: "MAGIC_LINK_TTL_MINUTES",
                    reason: "must be positive".to_string(),
                });
            }
            config = config.with_link_ttl(Duration::minutes(minutes));
        }

        if let Some(raw) = lookup("MAGIC_LINK_VALIDATE_SESSION") {
            let validate = raw.parse().map_err(|e| ConfigError::Invalid {
                var: "MAGIC_LINK_VALIDATE_SESSION",
                reason: format!("{e}"),
            })?;
            config = config.with_session_validation(validate);
        }

        Ok(config)
    }

    /// Set link lifetime.
    #[must_use]
    pub const fn with_link_ttl(mut self, ttl: Duration) -> Self {
        self.link_ttl = ttl;
        self
    }

    /// Enable or disable session matching.
    #[must_use]
    pub const fn with_session_validation(mut self, validate: bool) -> Self {
        self.validate_session_magic_link = validate;
        self
    }

    /// Set callback path.
    #[must_use]
    pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = path.into();
        self
    }

    /// Full callback URL (without token).
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}{}", self.base_url, self.callback_path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let err = MagicLinkConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecret("MAGIC_LINK_SECRET"));
    }

    #[test]
    fn test_blank_secret_is_fatal() {
        let err = MagicLinkConfig::from_lookup(lookup(&[("MAGIC_LINK_SECRET", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecret("MAGIC_LINK_SECRET"));
    }

    #[test]
    fn test_defaults() {
        let config = MagicLinkConfig::from_lookup(lookup(&[("MAGIC_LINK_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.callback_path, "/magic");
        assert_eq!(config.session_magic_link_key, "triggerdotdev:magiclink");
        assert_eq!(config.link_ttl, Duration::minutes(30));
        assert!(!config.validate_session_magic_link);
        assert_eq!(config.callback_url(), "http://localhost:3000/magic");
    }

    #[test]
    fn test_overrides() {
        let config = MagicLinkConfig::from_lookup(lookup(&[
            ("MAGIC_LINK_SECRET", "s3cret"),
            ("APP_ORIGIN", "https://app.example.com/"),
            ("MAGIC_LINK_TTL_MINUTES", "5"),
            ("MAGIC_LINK_VALIDATE_SESSION", "true"),
        ]))
        .unwrap();

        assert_eq!(config.callback_url(), "https://app.example.com/magic");
        assert_eq!(config.link_ttl, Duration::minutes(5));
        assert!(config.validate_session_magic_link);
    }

    #[test]
    fn test_invalid_ttl() {
        let err = MagicLinkConfig::from_lookup(lookup(&[
            ("MAGIC_LINK_SECRET", "s3cret"),
            ("MAGIC_LINK_TTL_MINUTES", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "MAGIC_LINK_TTL_MINUTES", .. }));
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let config = MagicLinkConfig::new("hunter2", "http://localhost").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
    }
}
