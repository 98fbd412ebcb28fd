//! Registered credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::base64url;
use crate::cose::CoseKey;

/// A credential persisted after a successful registration.
///
/// Only `sign_count` changes afterwards, and only through
/// [`CredentialStore::update_counter`](crate::store::CredentialStore::update_counter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(with = "base64url")]
    pub credential_id: Vec<u8>,
    #[serde(with = "base64url")]
    pub user_id: Vec<u8>,
    pub public_key: CoseKey,
    /// COSE algorithm identifier recorded at registration
    pub algorithm: i64,
    pub sign_count: u32,
    #[serde(default)]
    pub transports: Vec<String>,
    #[serde(with = "base64url")]
    pub aaguid: [u8; 16],
    pub attestation_format: String,
    #[serde(default)]
    pub backup_eligible: bool,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    /// Base64url credential ID, as it appears on the wire.
    pub fn id_b64(&self) -> String {
        base64url::encode(&self.credential_id)
    }

    /// AAGUID in its canonical hyphenated form.
    pub fn aaguid_string(&self) -> String {
        format_aaguid(&self.aaguid)
    }
}

/// Format a 16-byte AAGUID as `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
pub fn format_aaguid(aaguid: &[u8; 16]) -> String {
    uuid::Uuid::from_bytes(*aaguid).hyphenated().to_string()
}
