//! WebAuthn request/response types
//!
//! Defines the data structures for WebAuthn API communication. Finish requests
//! are the browser's `PublicKeyCredential` JSON and use the
//! [`passkey_core`] types directly.

use passkey_core::{base64url, AuthenticationResult, CreationOptions, Credential, RequestOptions};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request to start passkey registration
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartRegistrationRequest {
    /// Account name shown by the authenticator
    #[schema(example = "alice@example.com")]
    pub username: String,
    /// Human-readable name; defaults to `username`
    #[schema(example = "Alice")]
    pub display_name: Option<String>,
}

/// Response containing the registration challenge
#[derive(Debug, Serialize)]
pub struct StartRegistrationResponse {
    /// Credential creation options (to be passed to navigator.credentials.create)
    pub public_key: CreationOptions,
}

/// Request to start authentication
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartAuthenticationRequest {
    /// User handle (base64url) to restrict the allowed credentials; omit for discoverable login
    #[serde(default)]
    #[schema(example = "dXNlci0xMjM0")]
    pub user_id: Option<String>,
}

/// Response containing the authentication challenge
#[derive(Debug, Serialize)]
pub struct StartAuthenticationResponse {
    /// Credential request options (to be passed to navigator.credentials.get)
    pub public_key: RequestOptions,
}

/// Registered credential summary
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisteredCredentialResponse {
    /// Credential identifier (base64url)
    #[schema(example = "q83vASNFZ4k")]
    pub credential_id: String,
    /// Owning user handle (base64url)
    pub user_id: String,
    /// COSE algorithm identifier (-7 = ES256, -257 = RS256)
    #[schema(example = -7)]
    pub algorithm: i64,
    /// Signature counter reported at registration
    pub sign_count: u32,
    /// Authenticator model identifier
    #[schema(example = "00000000-0000-0000-0000-000000000000")]
    pub aaguid: String,
    /// Attestation statement format (recorded, not verified)
    #[schema(example = "none")]
    pub attestation_format: String,
    pub transports: Vec<String>,
    /// Whether the credential may be synced across devices
    pub backup_eligible: bool,
}

impl From<Credential> for RegisteredCredentialResponse {
    fn from(credential: Credential) -> Self {
        Self {
            credential_id: credential.id_b64(),
            user_id: base64url::encode(&credential.user_id),
            algorithm: credential.algorithm,
            sign_count: credential.sign_count,
            aaguid: credential.aaguid_string(),
            attestation_format: credential.attestation_format,
            transports: credential.transports,
            backup_eligible: credential.backup_eligible,
        }
    }
}

/// Verified login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticationResponseBody {
    /// Credential identifier (base64url)
    pub credential_id: String,
    /// Authenticated user handle (base64url)
    pub user_id: String,
    /// New stored signature counter
    pub sign_count: u32,
    /// Whether the authenticator verified the user (PIN, biometric)
    pub user_verified: bool,
    /// Whether the credential is currently backed up
    pub backed_up: bool,
}

impl From<AuthenticationResult> for AuthenticationResponseBody {
    fn from(result: AuthenticationResult) -> Self {
        Self {
            credential_id: base64url::encode(&result.credential_id),
            user_id: base64url::encode(&result.user_id),
            sign_count: result.sign_count,
            user_verified: result.user_verified,
            backed_up: result.backed_up,
        }
    }
}
