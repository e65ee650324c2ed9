//! Runtime-selected collaborator implementations.
//!
//! The router is generic over its collaborators, so the choice between a
//! console and a real backend is made once here.

use chrono::{DateTime, Utc};
use gateway_auth::{ConsoleEmailProvider, EmailProvider, SmtpEmailProvider, SmtpSettings};
use gateway_core::{ConsoleIngestionService, HttpIngestionService, IngestCustomEvent, IngestionService};
use tracing::info;

/// Where validated events go.
#[derive(Debug, Clone)]
pub enum IngestionBackend {
    /// Log events.
    Console(ConsoleIngestionService),
    /// POST events to an upstream service.
    Http(HttpIngestionService),
}

impl IngestionBackend {
    /// Upstream if `upstream_url` is set, console otherwise.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn from_upstream(upstream_url: Option<&str>) -> gateway_core::Result<Self> {
        match upstream_url {
            Some(url) => {
                info!(endpoint = %url, "Forwarding events upstream");
                Ok(Self::Http(HttpIngestionService::new(url)?))
            }
            None => {
                info!("INGEST_UPSTREAM_URL not set; logging events to console");
                Ok(Self::Console(ConsoleIngestionService::new()))
            }
        }
    }
}

impl IngestionService for IngestionBackend {
    async fn ingest(&self, request: IngestCustomEvent) -> gateway_core::Result<()> {
        match self {
            Self::Console(service) => service.ingest(request).await,
            Self::Http(service) => service.ingest(request).await,
        }
    }
}

/// How magic links are delivered.
#[derive(Clone)]
pub enum EmailBackend {
    /// Log links.
    Console(ConsoleEmailProvider),
    /// Send through SMTP.
    Smtp(SmtpEmailProvider),
}

impl EmailBackend {
    /// SMTP if configured, console otherwise.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP settings are unusable.
    pub fn from_settings(settings: Option<SmtpSettings>) -> gateway_auth::Result<Self> {
        match settings {
            Some(settings) => {
                info!(host = %settings.host, port = settings.port, "Sending magic links over SMTP");
                Ok(Self::Smtp(SmtpEmailProvider::new(settings)?))
            }
            None => {
                info!("SMTP_HOST not set; logging magic links to console");
                Ok(Self::Console(ConsoleEmailProvider::new()))
            }
        }
    }
}

impl EmailProvider for EmailBackend {
    async fn send_magic_link(
        &self,
        to: &str,
        magic_link: &str,
        expires_at: DateTime<Utc>,
    ) -> gateway_auth::Result<()> {
        match self {
            Self::Console(provider) => provider.send_magic_link(to, magic_link, expires_at).await,
            Self::Smtp(provider) => provider.send_magic_link(to, magic_link, expires_at).await,
        }
    }
}
