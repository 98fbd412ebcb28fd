//! WebAuthn storage module
//!
//! Provides storage for:
//! - **Challenges** (in-memory): challenges are short-lived and are never
//!   persisted. A background task purges expired ones.
//! - **Credentials** (PostgreSQL): registered credentials survive restarts.
//!
//! If `DATABASE_URL` is not set, falls back to in-memory storage for credentials
//! (useful for development, but credentials will be lost on restart).

mod postgres;

pub use postgres::PostgresCredentialStore;

use std::sync::Arc;
use std::time::Duration;

use passkey_core::{ChallengeStore, CredentialStore, InMemoryCredentialStore, StoreError};
use tokio::task::JoinHandle;

use crate::config::Config;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Credential store selected from configuration
pub struct CredentialBackend {
    pub store: Arc<dyn CredentialStore>,
    /// Whether credentials survive a restart
    pub persistent: bool,
}

impl CredentialBackend {
    /// In-memory storage (development only)
    pub fn in_memory() -> Self {
        tracing::warn!("Using in-memory credential storage - credentials will be lost on restart!");
        Self {
            store: Arc::new(InMemoryCredentialStore::new()),
            persistent: false,
        }
    }

    /// PostgreSQL storage with migrations applied
    pub async fn postgres(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let store = PostgresCredentialStore::new(database_url, max_connections).await?;
        store.migrate().await?;
        Ok(Self {
            store: Arc::new(store),
            persistent: true,
        })
    }

    /// Uses PostgreSQL if a database URL is configured, otherwise falls back to in-memory.
    pub async fn from_config(config: &Config) -> Result<Self, StorageError> {
        match &config.database_url {
            Some(url) => {
                tracing::info!("Using PostgreSQL credential storage");
                Self::postgres(url, config.database_max_connections).await
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory storage");
                Ok(Self::in_memory())
            }
        }
    }
}

/// Periodically drop expired challenges so abandoned ceremonies don't pile up.
pub fn spawn_challenge_purge(
    challenges: Arc<dyn ChallengeStore>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match challenges.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "Expired challenges purged"),
                Err(e) => tracing::error!(error = %e, "Challenge purge failed"),
            }
        }
    })
}
