//! Registration ceremony.
//!
//! `Start → ClientDataValidated → AttestationDecoded → CredentialExtracted → Done`
//!
//! Attestation statements are not verified; the format name is recorded on
//! the credential.

use chrono::Utc;

use crate::attestation::AttestationObject;
use crate::authenticator_data::AuthenticatorData;
use crate::base64url;
use crate::challenge::{CeremonyKind, ChallengeScope};
use crate::client_data::TYPE_CREATE;
use crate::cose::CoseAlgorithm;
use crate::credential::Credential;
use crate::error::{CeremonyError, Result};
use crate::relying_party::{log_rejection, RelyingParty};
use crate::types::{
    decode_credential_id, decode_field, AuthenticatorSelection, CreationOptions,
    CredentialDescriptor, PubKeyCredParam, RegistrationResponse, RelyingPartyEntity, UserEntity,
    PUBLIC_KEY_TYPE,
};
use crate::verify::PublicKey;

/// Largest user handle permitted by WebAuthn.
pub const MAX_USER_ID_LEN: usize = 64;

/// Account a new credential is registered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Opaque, stable user handle (1 to 64 bytes, no personal data)
    pub id: Vec<u8>,
    pub name: String,
    pub display_name: String,
}

impl RelyingParty {
    /// Issue a registration challenge and the matching creation options.
    ///
    /// Credentials the user already holds are listed in `excludeCredentials`.
    pub async fn begin_registration(&self, user: NewUser) -> Result<CreationOptions> {
        if user.id.is_empty() || user.id.len() > MAX_USER_ID_LEN {
            return Err(CeremonyError::MalformedClientData(format!(
                "user handle must be 1 to {MAX_USER_ID_LEN} bytes, got {}",
                user.id.len()
            )));
        }

        let exclude_credentials = self
            .credentials()
            .list_for_user(&user.id)
            .await?
            .into_iter()
            .map(|c| CredentialDescriptor::new(c.credential_id, c.transports))
            .collect();

        let challenge = self
            .challenges()
            .issue(ChallengeScope::registration(user.id.clone()))
            .await?;

        tracing::info!(
            user_id = %base64url::encode(&user.id),
            expires_at = %challenge.expires_at,
            "Registration started"
        );

        Ok(CreationOptions {
            challenge: challenge.value,
            rp: RelyingPartyEntity {
                id: self.config().rp_id().to_string(),
                name: self.config().rp_name().to_string(),
            },
            user: UserEntity {
                id: user.id,
                name: user.name,
                display_name: user.display_name,
            },
            pub_key_cred_params: CoseAlgorithm::SUPPORTED
                .iter()
                .map(|alg| PubKeyCredParam {
                    credential_type: PUBLIC_KEY_TYPE.to_string(),
                    alg: alg.id(),
                })
                .collect(),
            timeout: self.timeout_ms(),
            attestation: "none".to_string(),
            exclude_credentials,
            authenticator_selection: AuthenticatorSelection::default(),
        })
    }

    /// Verify a registration response and persist the new credential.
    pub async fn finish_registration(&self, response: &RegistrationResponse) -> Result<Credential> {
        match self.complete_registration(response).await {
            Ok(credential) => {
                tracing::info!(
                    credential_id = %credential.id_b64(),
                    user_id = %base64url::encode(&credential.user_id),
                    algorithm = credential.algorithm,
                    attestation_format = %credential.attestation_format,
                    aaguid = %credential.aaguid_string(),
                    "Registration completed"
                );
                Ok(credential)
            }
            Err(err) => {
                log_rejection(CeremonyKind::Registration, Some(&response.id), &err);
                Err(err)
            }
        }
    }

    async fn complete_registration(&self, response: &RegistrationResponse) -> Result<Credential> {
        let (_, _, scope) = self
            .validate_client_data(
                &response.response.client_data_json,
                CeremonyKind::Registration,
                TYPE_CREATE,
            )
            .await?;
        let user_id = scope.user_id.ok_or(CeremonyError::ChallengeNotFound)?;

        let raw_id = decode_credential_id(&response.id, &response.raw_id, &response.credential_type)?;
        let attestation_bytes =
            decode_field("attestationObject", &response.response.attestation_object)?;
        let attestation = AttestationObject::parse(&attestation_bytes)?;
        let auth_data = AuthenticatorData::parse(attestation.auth_data)?;

        if !auth_data.matches_rp_id(self.config().rp_id()) {
            return Err(CeremonyError::RpIdHashMismatch);
        }
        if !auth_data.flags.user_present() {
            return Err(CeremonyError::UserPresenceMissing);
        }

        let attested = auth_data.attested_credential_data.ok_or_else(|| {
            CeremonyError::MalformedAuthenticatorData(
                "attested credential data missing from registration".into(),
            )
        })?;
        if attested.credential_id != raw_id {
            return Err(CeremonyError::MalformedAttestationObject(
                "attested credential ID does not match rawId".into(),
            ));
        }

        if self.credentials().get(&attested.credential_id).await?.is_some() {
            return Err(CeremonyError::DuplicateCredential);
        }

        // Keys that cannot form a verifier key are never stored
        let algorithm = PublicKey::from_cose(&attested.credential_public_key)?.algorithm();
        let credential = Credential {
            credential_id: attested.credential_id,
            user_id,
            public_key: attested.credential_public_key,
            algorithm: algorithm.id(),
            sign_count: auth_data.sign_count,
            transports: response.response.transports.clone(),
            aaguid: attested.aaguid,
            attestation_format: attestation.fmt.to_string(),
            backup_eligible: auth_data.flags.backup_eligible(),
            created_at: Utc::now(),
        };

        // A concurrent registration of the same ID loses here as Duplicate.
        self.credentials().put(credential.clone()).await?;
        Ok(credential)
    }
}
