//! Authentication ceremony.
//!
//! `Start → ClientDataValidated → AuthDataDecoded → SignatureVerified → CounterAdvanced → Done`

use crate::authenticator_data::AuthenticatorData;
use crate::base64url;
use crate::challenge::{CeremonyKind, ChallengeScope};
use crate::client_data::TYPE_GET;
use crate::error::{CeremonyError, Result};
use crate::relying_party::{log_rejection, RelyingParty};
use crate::types::{
    decode_credential_id, decode_field, AuthenticationResponse, AuthenticationResult,
    CredentialDescriptor, RequestOptions,
};
use crate::verify::verify_assertion;

impl RelyingParty {
    /// Issue an authentication challenge.
    ///
    /// With a user handle, `allowCredentials` lists that user's credentials
    /// and only those are accepted. Without one, any registered credential
    /// may answer (discoverable credentials).
    pub async fn begin_authentication(&self, user_id: Option<&[u8]>) -> Result<RequestOptions> {
        let allow_credentials = match user_id {
            Some(user_id) => {
                let credentials = self.credentials().list_for_user(user_id).await?;
                if credentials.is_empty() {
                    return Err(CeremonyError::CredentialNotFound);
                }
                credentials
                    .into_iter()
                    .map(|c| CredentialDescriptor::new(c.credential_id, c.transports))
                    .collect::<Vec<_>>()
            }
            None => Vec::new(),
        };

        let scope = ChallengeScope::authentication(
            allow_credentials.iter().map(|d| d.id.clone()).collect(),
        );
        let challenge = self.challenges().issue(scope).await?;

        tracing::info!(
            allowed = allow_credentials.len(),
            expires_at = %challenge.expires_at,
            "Authentication started"
        );

        Ok(RequestOptions {
            challenge: challenge.value,
            rp_id: self.config().rp_id().to_string(),
            timeout: self.timeout_ms(),
            allow_credentials,
            user_verification: "preferred".to_string(),
        })
    }

    /// Verify an assertion and advance the credential's sign counter.
    pub async fn finish_authentication(
        &self,
        response: &AuthenticationResponse,
    ) -> Result<AuthenticationResult> {
        match self.complete_authentication(response).await {
            Ok(result) => {
                tracing::info!(
                    credential_id = %response.id,
                    user_id = %base64url::encode(&result.user_id),
                    sign_count = result.sign_count,
                    user_verified = result.user_verified,
                    "Authentication completed"
                );
                Ok(result)
            }
            Err(err) => {
                log_rejection(CeremonyKind::Authentication, Some(&response.id), &err);
                Err(err)
            }
        }
    }

    async fn complete_authentication(
        &self,
        response: &AuthenticationResponse,
    ) -> Result<AuthenticationResult> {
        let (client_data_json, _, scope) = self
            .validate_client_data(
                &response.response.client_data_json,
                CeremonyKind::Authentication,
                TYPE_GET,
            )
            .await?;

        let auth_data_bytes =
            decode_field("authenticatorData", &response.response.authenticator_data)?;
        let auth_data = AuthenticatorData::parse(&auth_data_bytes)?;
        if !auth_data.matches_rp_id(self.config().rp_id()) {
            return Err(CeremonyError::RpIdHashMismatch);
        }
        if !auth_data.flags.user_present() {
            return Err(CeremonyError::UserPresenceMissing);
        }

        let raw_id = decode_credential_id(&response.id, &response.raw_id, &response.credential_type)?;
        if !scope.allows(&raw_id) {
            return Err(CeremonyError::CredentialNotFound);
        }
        let credential = self
            .credentials()
            .get(&raw_id)
            .await?
            .ok_or(CeremonyError::CredentialNotFound)?;
        if let Some(user_handle) = response.response.user_handle.as_deref() {
            let user_handle = decode_field("userHandle", user_handle)?;
            if !user_handle.is_empty() && user_handle != credential.user_id {
                return Err(CeremonyError::CredentialNotFound);
            }
        }

        let signature = decode_field("signature", &response.response.signature)?;
        verify_assertion(
            credential.algorithm,
            &credential.public_key,
            &auth_data_bytes,
            &client_data_json,
            &signature,
        )?;

        let stored = credential.sign_count;
        let received = auth_data.sign_count;
        // Authenticators without a counter report zero forever.
        if !(stored == 0 && received == 0) {
            if received <= stored {
                return Err(CeremonyError::CounterRegression { stored, received });
            }
            if !self.credentials().update_counter(&raw_id, received).await? {
                // Another assertion advanced the counter first.
                return Err(CeremonyError::CounterRegression { stored, received });
            }
        }

        Ok(AuthenticationResult {
            credential_id: raw_id,
            user_id: credential.user_id,
            sign_count: received,
            user_verified: auth_data.flags.user_verified(),
            backed_up: auth_data.flags.backed_up(),
        })
    }
}
