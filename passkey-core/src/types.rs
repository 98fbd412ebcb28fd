//! Ceremony options and responses as exchanged with the browser.
//!
//! Field names follow the WebAuthn JSON serialization (`camelCase`). Binary
//! fields in options are serialized as unpadded base64url. Binary fields in
//! responses are kept as the submitted strings and decoded by the ceremony,
//! so an undecodable field surfaces as a ceremony error.

use serde::{Deserialize, Serialize};

use crate::base64url;
use crate::error::{CeremonyError, Result};

/// Credential type of every WebAuthn public key credential.
pub const PUBLIC_KEY_TYPE: &str = "public-key";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelyingPartyEntity {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// Opaque user handle, at most 64 bytes
    #[serde(with = "base64url")]
    pub id: Vec<u8>,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub alg: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub credential_type: String,
    #[serde(with = "base64url")]
    pub id: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transports: Vec<String>,
}

impl CredentialDescriptor {
    pub fn new(id: Vec<u8>, transports: Vec<String>) -> Self {
        Self {
            credential_type: PUBLIC_KEY_TYPE.to_string(),
            id,
            transports,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    pub resident_key: String,
    pub user_verification: String,
}

impl Default for AuthenticatorSelection {
    fn default() -> Self {
        Self {
            resident_key: "preferred".to_string(),
            user_verification: "preferred".to_string(),
        }
    }
}

/// Options for `navigator.credentials.create({ publicKey })`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationOptions {
    pub challenge: String,
    pub rp: RelyingPartyEntity,
    pub user: UserEntity,
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
    /// Milliseconds
    pub timeout: u64,
    pub attestation: String,
    #[serde(default)]
    pub exclude_credentials: Vec<CredentialDescriptor>,
    pub authenticator_selection: AuthenticatorSelection,
}

/// Options for `navigator.credentials.get({ publicKey })`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub challenge: String,
    pub rp_id: String,
    /// Milliseconds
    pub timeout: u64,
    #[serde(default)]
    pub allow_credentials: Vec<CredentialDescriptor>,
    pub user_verification: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub attestation_object: String,
    #[serde(default)]
    pub transports: Vec<String>,
}

/// Result of `navigator.credentials.create()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub response: AttestationResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub authenticator_data: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
}

/// Result of `navigator.credentials.get()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub response: AssertionResponse,
}

/// Outcome of a successful authentication ceremony.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResult {
    #[serde(with = "base64url")]
    pub credential_id: Vec<u8>,
    #[serde(with = "base64url")]
    pub user_id: Vec<u8>,
    pub sign_count: u32,
    pub user_verified: bool,
    pub backed_up: bool,
}

/// Decode a base64url response field.
pub(crate) fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    base64url::decode(value)
        .map_err(|e| CeremonyError::MalformedClientData(format!("{name} is not base64url: {e}")))
}

/// Check the credential envelope and return the decoded `rawId`.
///
/// `id` is the base64url form of `rawId` and must agree with it.
pub(crate) fn decode_credential_id(id: &str, raw_id: &str, credential_type: &str) -> Result<Vec<u8>> {
    if credential_type != PUBLIC_KEY_TYPE {
        return Err(CeremonyError::MalformedClientData(format!(
            "credential type {credential_type}"
        )));
    }
    let raw = decode_field("rawId", raw_id)?;
    if raw.is_empty() {
        return Err(CeremonyError::MalformedClientData("rawId is empty".into()));
    }
    if decode_field("id", id)? != raw {
        return Err(CeremonyError::MalformedClientData(
            "id does not match rawId".into(),
        ));
    }
    Ok(raw)
}
