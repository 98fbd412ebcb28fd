//! Passkey Server Library - REST API for WebAuthn registration and authentication
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod config;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod webauthn;

pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use openapi::ApiDoc;
pub use routes::{create_router, create_router_with_config};
pub use state::AppState;
pub use webauthn::{CredentialBackend, PostgresCredentialStore, StorageError};
