//! Gateway server.
//!
//! Serves event intake and magic-link sign-in over HTTP.
//!
//! Run with: `MAGIC_LINK_SECRET=... cargo run --bin gateway-server`
//! Health: `http://localhost:3030/health`

mod backends;
mod config;

use anyhow::Context;
use backends::{EmailBackend, IngestionBackend};
use config::Config;
use gateway_auth::{
    Authenticator, InMemorySessionStore, InMemoryUserRepository, LoggingPostAuthentication,
    MagicLinkConfig, register_email_link_strategy,
};
use gateway_core::{EnvironmentApiKeyAuthenticator, EventIntakeHandler, InMemoryEnvironmentRepository};
use gateway_web::{AppState, router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    init_tracing();

    // The secret is required; refuse to start without it.
    let magic_link = MagicLinkConfig::from_env().context("Invalid magic link configuration")?;
    let config = Config::from_env().context("Invalid server configuration")?;

    let environments = InMemoryEnvironmentRepository::from_pairs(&config.api_keys)
        .context("Invalid API_KEYS")?;
    if environments.is_empty() {
        warn!("API_KEYS is empty; every intake request will be rejected");
    } else {
        info!(environments = environments.len(), "Loaded API keys");
    }

    let intake = EventIntakeHandler::new(
        EnvironmentApiKeyAuthenticator::new(environments),
        IngestionBackend::from_upstream(config.ingest.upstream_url.as_deref())?,
    );

    let secure_cookies = magic_link.base_url.starts_with("https://");
    let callback_path = magic_link.callback_path.clone();
    let sessions = InMemorySessionStore::new();
    spawn_session_sweeper(sessions.clone());
    let mut authenticator = Authenticator::new(sessions);
    register_email_link_strategy(
        &mut authenticator,
        magic_link,
        EmailBackend::from_settings(config.smtp.clone())?,
        InMemoryUserRepository::new(),
        LoggingPostAuthentication::new(),
    );

    let state = AppState::new(intake, authenticator, callback_path)
        .with_secure_cookies(secure_cookies);
    let app = router(state);

    let addr = config.server.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Gateway listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

/// How often idle sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

fn spawn_session_sweeper(sessions: InMemorySessionStore) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = sessions.evict_expired();
            if evicted > 0 {
                info!(evicted, remaining = sessions.len(), "Swept idle sessions");
            }
        }
    });
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gateway_server=info,gateway_web=info,gateway_core=info,gateway_auth=info,tower_http=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
