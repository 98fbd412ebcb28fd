//! Passkey Core - WebAuthn/FIDO2 ceremony verification
//!
//! Turns the raw data produced by a user's authenticator into a verified
//! registration or login decision.
//!
//! # Features
//!
//! - Positional CBOR decoding of attestation objects and COSE keys
//! - ES256 (ECDSA P-256) and RS256 (RSASSA-PKCS1-v1_5) assertion signatures
//! - One-time challenges with atomic consumption
//! - Monotonic sign counters to detect cloned authenticators
//!
//! Attestation statements are recorded but not verified against
//! manufacturer certificate chains.
//!
//! # Example
//!
//! ```no_run
//! use passkey_core::{NewUser, RelyingParty, RelyingPartyConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RelyingPartyConfig::new("example.com", "Example", ["https://example.com"])?;
//! let rp = RelyingParty::in_memory(config);
//!
//! // Send these options to navigator.credentials.create()
//! let options = rp
//!     .begin_registration(NewUser {
//!         id: b"user-1234".to_vec(),
//!         name: "alice@example.com".into(),
//!         display_name: "Alice".into(),
//!     })
//!     .await?;
//! # let response: passkey_core::RegistrationResponse = todo!();
//!
//! // ...and verify what the browser sends back
//! let credential = rp.finish_registration(&response).await?;
//! # Ok(())
//! # }
//! ```

pub mod attestation;
pub mod authenticator_data;
pub mod base64url;
pub mod cbor;
pub mod challenge;
pub mod client_data;
pub mod config;
pub mod cose;
pub mod credential;
pub mod error;
pub mod store;
pub mod types;
pub mod verify;

mod authentication;
mod registration;
mod relying_party;

// Re-export main types for convenience
pub use attestation::AttestationObject;
pub use authenticator_data::{AttestedCredentialData, AuthenticatorData, AuthenticatorFlags};
pub use challenge::{CeremonyKind, Challenge, ChallengeScope};
pub use client_data::ClientData;
pub use config::{ConfigError, RelyingPartyConfig};
pub use cose::{CoseAlgorithm, CoseKey, EcCurve};
pub use credential::Credential;
pub use error::{CeremonyError, Result};
pub use registration::{NewUser, MAX_USER_ID_LEN};
pub use relying_party::{RelyingParty, SECURITY_TARGET};
pub use store::{
    ChallengeStore, CredentialStore, InMemoryChallengeStore, InMemoryCredentialStore, StoreError,
};
pub use types::{
    AuthenticationResponse, AuthenticationResult, CreationOptions, RegistrationResponse,
    RequestOptions,
};
