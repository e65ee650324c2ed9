//! Server configuration.
//!
//! Loaded from environment variables (a `.env` file is read first when
//! present). Magic-link settings live in
//! [`MagicLinkConfig`](gateway_auth::MagicLinkConfig) and are loaded
//! separately so a missing secret is reported on its own.

use gateway_auth::{ConfigError, SmtpSettings};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listener configuration
    pub server: ServerConfig,
    /// Where validated events go
    pub ingest: IngestConfig,
    /// SMTP delivery; `None` logs links to the console
    pub smtp: Option<SmtpSettings>,
    /// `key=slug` pairs seeding the environment repository
    pub api_keys: String,
}

/// Listener configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind
    pub bind_addr: IpAddr,
    /// Port to bind
    pub port: u16,
}

impl ServerConfig {
    /// Socket address to listen on.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Ingestion configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Upstream endpoint; `None` logs events to the console
    pub upstream_url: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable cannot be parsed or
    /// the SMTP settings are incomplete.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration using an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind_addr = match var("BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|e| invalid("BIND_ADDR", e))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match var("HTTP_PORT") {
            Some(raw) => raw.parse().map_err(|e| invalid("HTTP_PORT", e))?,
            None => 3030,
        };

        let smtp = match var("SMTP_HOST") {
            Some(host) => Some(SmtpSettings {
                host,
                port: match var("SMTP_PORT") {
                    Some(raw) => raw.parse().map_err(|e| invalid("SMTP_PORT", e))?,
                    None => 587,
                },
                username: var("SMTP_USERNAME").ok_or_else(|| missing("SMTP_USERNAME"))?,
                password: var("SMTP_PASSWORD").ok_or_else(|| missing("SMTP_PASSWORD"))?,
                from_email: var("FROM_EMAIL").ok_or_else(|| missing("FROM_EMAIL"))?,
                from_name: var("FROM_NAME").unwrap_or_else(|| "Gateway".to_string()),
            }),
            None => None,
        };

        Ok(Self {
            server: ServerConfig { bind_addr, port },
            ingest: IngestConfig {
                upstream_url: var("INGEST_UPSTREAM_URL"),
            },
            smtp,
            api_keys: var("API_KEYS").unwrap_or_default(),
        })
    }
}

fn invalid(var: &'static str, error: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: error.to_string(),
    }
}

fn missing(var: &'static str) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: "required when SMTP_HOST is set".to_string(),
    }
}
