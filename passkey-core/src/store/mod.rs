//! Persistence interfaces used by the ceremonies.
//!
//! - **Challenges** need atomic check-and-delete: a challenge is handed out
//!   once and accepted at most once.
//! - **Credentials** need atomic compare-and-set-if-greater on the sign
//!   counter, so two concurrent assertions cannot both advance it.
//!
//! In-memory implementations live in [`memory`]; durable backends implement
//! the same traits.

mod memory;

pub use memory::{InMemoryChallengeStore, InMemoryCredentialStore};

use async_trait::async_trait;

use crate::challenge::{Challenge, ChallengeScope};
use crate::credential::Credential;
use crate::error::CeremonyError;

/// Storage errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Credential already registered")]
    Duplicate,

    #[error("Random number generator failure: {0}")]
    Rng(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for CeremonyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => CeremonyError::DuplicateCredential,
            other => CeremonyError::Storage(other.to_string()),
        }
    }
}

/// Issues and consumes one-time challenges.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Generate, store and return a fresh challenge.
    async fn issue(&self, scope: ChallengeScope) -> Result<Challenge, StoreError>;

    /// Remove the challenge and return its scope.
    ///
    /// Missing, expired and already-consumed challenges all yield `None`.
    async fn consume(&self, value: &str) -> Result<Option<ChallengeScope>, StoreError>;

    /// Drop expired challenges, returning how many were removed.
    async fn purge_expired(&self) -> Result<usize, StoreError>;

    /// Number of outstanding challenges, expired ones included.
    async fn len(&self) -> Result<usize, StoreError>;
}

/// Durable credential storage.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, credential_id: &[u8]) -> Result<Option<Credential>, StoreError>;

    /// Insert a new credential; an existing ID yields [`StoreError::Duplicate`].
    async fn put(&self, credential: Credential) -> Result<(), StoreError>;

    /// Set the sign counter to `sign_count` if it is strictly greater than
    /// the stored value. Returns whether the update happened.
    async fn update_counter(&self, credential_id: &[u8], sign_count: u32)
        -> Result<bool, StoreError>;

    async fn list_for_user(&self, user_id: &[u8]) -> Result<Vec<Credential>, StoreError>;

    /// Backend liveness, used by readiness probes.
    async fn check_health(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        assert_eq!(
            CeremonyError::from(StoreError::Duplicate),
            CeremonyError::DuplicateCredential
        );
        assert!(matches!(
            CeremonyError::from(StoreError::Backend("down".into())),
            CeremonyError::Storage(m) if m.contains("down")
        ));
    }
}
