//! In-memory stores backed by sharded concurrent maps.
//!
//! Suitable for a single process. Challenges are short-lived and never need
//! persistence; credentials kept here are lost on restart.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use super::{ChallengeStore, CredentialStore, StoreError};
use crate::challenge::{
    expiry_from_now, random_challenge, Challenge, ChallengeScope, DEFAULT_CHALLENGE_TTL,
};
use crate::credential::Credential;

struct ChallengeEntry {
    scope: ChallengeScope,
    expires_at: Instant,
}

/// Challenge store keyed by the challenge value.
pub struct InMemoryChallengeStore {
    entries: DashMap<String, ChallengeEntry>,
    ttl: Duration,
}

impl InMemoryChallengeStore {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CHALLENGE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for InMemoryChallengeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChallengeStore for InMemoryChallengeStore {
    async fn issue(&self, scope: ChallengeScope) -> Result<Challenge, StoreError> {
        let expires_at = Instant::now().checked_add(self.ttl).ok_or_else(|| {
            StoreError::Backend(format!("challenge TTL {:?} out of range", self.ttl))
        })?;
        let value = random_challenge().map_err(|e| StoreError::Rng(e.to_string()))?;

        self.entries.insert(
            value.clone(),
            ChallengeEntry {
                scope: scope.clone(),
                expires_at,
            },
        );

        Ok(Challenge {
            value,
            expires_at: expiry_from_now(self.ttl),
            scope,
        })
    }

    async fn consume(&self, value: &str) -> Result<Option<ChallengeScope>, StoreError> {
        // Removal is the critical section: at most one caller gets the entry.
        let Some((_, entry)) = self.entries.remove(value) else {
            return Ok(None);
        };
        if entry.expires_at > Instant::now() {
            Ok(Some(entry.scope))
        } else {
            Ok(None)
        }
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        Ok(before.saturating_sub(self.entries.len()))
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.len())
    }
}

impl std::fmt::Debug for InMemoryChallengeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryChallengeStore")
            .field("pending", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Credential store keyed by raw credential ID.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: DashMap<Vec<u8>, Credential>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.credentials.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, credential_id: &[u8]) -> Result<Option<Credential>, StoreError> {
        Ok(self
            .credentials
            .get(credential_id)
            .map(|entry| entry.value().clone()))
    }

    async fn put(&self, credential: Credential) -> Result<(), StoreError> {
        match self.credentials.entry(credential.credential_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(credential);
                Ok(())
            }
        }
    }

    async fn update_counter(
        &self,
        credential_id: &[u8],
        sign_count: u32,
    ) -> Result<bool, StoreError> {
        match self.credentials.get_mut(credential_id) {
            Some(mut entry) if entry.sign_count < sign_count => {
                entry.sign_count = sign_count;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_for_user(&self, user_id: &[u8]) -> Result<Vec<Credential>, StoreError> {
        let mut credentials: Vec<Credential> = self
            .credentials
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        credentials.sort_by_key(|c| c.created_at);
        Ok(credentials)
    }
}

impl std::fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCredentialStore")
            .field("credentials", &self.credentials.len())
            .finish()
    }
}
