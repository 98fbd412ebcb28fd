//! WebAuthn/FIDO2 passkey module
//!
//! ## Architecture
//!
//! - `handlers`: HTTP endpoint handlers for registration/authentication
//! - `storage`: credential backends (PostgreSQL or memory) and challenge purging
//! - `types`: Request/response types for the WebAuthn API

pub mod handlers;
pub mod storage;
mod types;

pub use handlers::{
    finish_authentication, finish_registration, start_authentication, start_registration,
};
pub use storage::{spawn_challenge_purge, CredentialBackend, PostgresCredentialStore, StorageError};
pub use types::{
    AuthenticationResponseBody, RegisteredCredentialResponse, StartAuthenticationRequest,
    StartAuthenticationResponse, StartRegistrationRequest, StartRegistrationResponse,
};
