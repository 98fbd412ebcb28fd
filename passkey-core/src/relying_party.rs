//! Relying Party entry points.
//!
//! A [`RelyingParty`] bundles the configuration with the two stores and
//! exposes the four ceremony steps:
//!
//! - [`begin_registration`](RelyingParty::begin_registration) /
//!   [`finish_registration`](RelyingParty::finish_registration)
//! - [`begin_authentication`](RelyingParty::begin_authentication) /
//!   [`finish_authentication`](RelyingParty::finish_authentication)

use std::sync::Arc;

use crate::challenge::{CeremonyKind, ChallengeScope};
use crate::client_data::ClientData;
use crate::config::RelyingPartyConfig;
use crate::error::{CeremonyError, Result};
use crate::store::{ChallengeStore, CredentialStore, InMemoryChallengeStore, InMemoryCredentialStore};
use crate::types::decode_field;

/// Tracing target for rejections that indicate tampering or cloning.
pub const SECURITY_TARGET: &str = "passkey::security";

pub struct RelyingParty {
    config: RelyingPartyConfig,
    challenges: Arc<dyn ChallengeStore>,
    credentials: Arc<dyn CredentialStore>,
}

impl RelyingParty {
    pub fn new(
        config: RelyingPartyConfig,
        challenges: Arc<dyn ChallengeStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            config,
            challenges,
            credentials,
        }
    }

    /// Both stores in memory, challenges expiring after the configured TTL.
    pub fn in_memory(config: RelyingPartyConfig) -> Self {
        let challenges = Arc::new(InMemoryChallengeStore::with_ttl(config.challenge_ttl()));
        Self::new(config, challenges, Arc::new(InMemoryCredentialStore::new()))
    }

    pub fn config(&self) -> &RelyingPartyConfig {
        &self.config
    }

    pub fn challenges(&self) -> &Arc<dyn ChallengeStore> {
        &self.challenges
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub(crate) fn timeout_ms(&self) -> u64 {
        u64::try_from(self.config.timeout().as_millis()).unwrap_or(u64::MAX)
    }

    /// Decode and validate `clientDataJSON`, consuming its challenge.
    ///
    /// The challenge is consumed before type and origin are checked, so a
    /// rejected attempt still burns it.
    pub(crate) async fn validate_client_data(
        &self,
        encoded: &str,
        kind: CeremonyKind,
        expected_type: &'static str,
    ) -> Result<(Vec<u8>, ClientData, ChallengeScope)> {
        let raw = decode_field("clientDataJSON", encoded)?;
        let client_data = ClientData::parse(&raw)?;

        let scope = self
            .challenges
            .consume(&client_data.challenge)
            .await?
            .filter(|scope| scope.kind == kind)
            .ok_or(CeremonyError::ChallengeNotFound)?;

        client_data.require_type(expected_type)?;
        client_data.require_origin(self.config.origins(), self.config.allow_cross_origin())?;

        Ok((raw, client_data, scope))
    }
}

impl std::fmt::Debug for RelyingParty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelyingParty")
            .field("rp_id", &self.config.rp_id())
            .field("origins", &self.config.origins())
            .finish_non_exhaustive()
    }
}

/// Log a rejected ceremony; security events go to [`SECURITY_TARGET`].
pub(crate) fn log_rejection(kind: CeremonyKind, credential_id: Option<&str>, err: &CeremonyError) {
    if err.is_security_event() {
        tracing::warn!(
            target: SECURITY_TARGET,
            ceremony = kind.as_str(),
            credential_id = credential_id.unwrap_or("-"),
            reason = err.kind(),
            error = %err,
            "Security event during ceremony"
        );
    } else if matches!(err, CeremonyError::Storage(_)) {
        tracing::error!(ceremony = kind.as_str(), error = %err, "Ceremony storage failure");
    } else {
        tracing::warn!(
            ceremony = kind.as_str(),
            credential_id = credential_id.unwrap_or("-"),
            reason = err.kind(),
            error = %err,
            "Ceremony rejected"
        );
    }
}
