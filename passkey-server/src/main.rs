//! Passkey Server - REST API for WebAuthn registration and authentication
//!
//! Endpoints:
//! - POST /webauthn/register/{start,finish}
//! - POST /webauthn/authenticate/{start,finish}
//! - GET /health, GET /ready, GET /api-docs/openapi.json
//!
//! Relying Party identity comes from `WEBAUTHN_RP_ID`, `WEBAUTHN_RP_NAME` and
//! `WEBAUTHN_RP_ORIGIN`; see [`passkey_server::Config`] for server settings.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use passkey_core::{InMemoryChallengeStore, RelyingParty, RelyingPartyConfig};
use passkey_server::webauthn::spawn_challenge_purge;
use passkey_server::{create_router_with_config, AppState, Config, CredentialBackend};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("passkey_server=info,passkey=info,tower_http=info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    let rp_config = RelyingPartyConfig::from_env()?;

    tracing::info!(
        rp_id = %rp_config.rp_id(),
        origins = ?rp_config.origins(),
        "Relying Party configured"
    );

    let backend = CredentialBackend::from_config(&config).await?;
    let challenges = Arc::new(InMemoryChallengeStore::with_ttl(rp_config.challenge_ttl()));
    let relying_party = RelyingParty::new(rp_config, challenges, backend.store);
    let state = AppState::new(relying_party, backend.persistent);

    let purge = spawn_challenge_purge(
        state.relying_party.challenges().clone(),
        config.challenge_purge_interval(),
    );

    let app = create_router_with_config(&config, state)?;

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Passkey server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    purge.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
