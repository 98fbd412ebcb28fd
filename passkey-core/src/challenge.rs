//! One-time ceremony challenges.

use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::base64url;

/// Number of random bytes in a challenge.
pub const CHALLENGE_LEN: usize = 32;

/// Default challenge lifetime.
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(60);

/// Ceremony a challenge was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CeremonyKind {
    Registration,
    Authentication,
}

impl CeremonyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Authentication => "authentication",
        }
    }
}

/// What a challenge may be used for, returned on consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeScope {
    pub kind: CeremonyKind,
    /// User handle the new credential will belong to (registration only)
    #[serde(default, with = "base64url::option")]
    pub user_id: Option<Vec<u8>>,
    /// Credential IDs acceptable for this assertion; empty means any
    #[serde(default)]
    pub allow_credentials: Vec<Vec<u8>>,
}

impl ChallengeScope {
    pub fn registration(user_id: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: CeremonyKind::Registration,
            user_id: Some(user_id.into()),
            allow_credentials: Vec::new(),
        }
    }

    pub fn authentication(allow_credentials: Vec<Vec<u8>>) -> Self {
        Self {
            kind: CeremonyKind::Authentication,
            user_id: None,
            allow_credentials,
        }
    }

    /// Whether `credential_id` is acceptable under this scope's allow-list.
    pub fn allows(&self, credential_id: &[u8]) -> bool {
        self.allow_credentials.is_empty()
            || self
                .allow_credentials
                .iter()
                .any(|allowed| allowed.as_slice() == credential_id)
    }
}

/// An issued challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Base64url encoding of the random bytes; also the lookup key
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub scope: ChallengeScope,
}

/// Draw a fresh challenge value from the operating system RNG.
pub fn random_challenge() -> Result<String, rand::Error> {
    let mut bytes = [0u8; CHALLENGE_LEN];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(base64url::encode(bytes))
}

/// Wall-clock expiry for a challenge issued now.
pub fn expiry_from_now(ttl: Duration) -> DateTime<Utc> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    Utc::now().checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}
