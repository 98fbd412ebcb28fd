//! Authenticator data parsing.
//!
//! Layout (WebAuthn §6.1):
//!
//! ```text
//! rpIdHash (32) | flags (1) | signCount (4, BE)
//!   [ aaguid (16) | credIdLen (2, BE) | credId | COSE_Key ]   if AT
//!   [ extensions (CBOR map) ]                               if ED
//! ```

use sha2::{Digest, Sha256};

use crate::cbor::CborReader;
use crate::cose::CoseKey;
use crate::error::{CeremonyError, Result};

/// Length of the fixed header: rpIdHash, flags and signCount.
pub const MIN_AUTH_DATA_LEN: usize = 37;

/// Largest credential ID an authenticator may return.
pub const MAX_CREDENTIAL_ID_LEN: usize = 1023;

const AAGUID_LEN: usize = 16;

/// Authenticator flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatorFlags(pub u8);

impl AuthenticatorFlags {
    pub const USER_PRESENT: u8 = 0x01;
    pub const USER_VERIFIED: u8 = 0x04;
    pub const BACKUP_ELIGIBLE: u8 = 0x08;
    pub const BACKED_UP: u8 = 0x10;
    pub const ATTESTED_CREDENTIAL_DATA: u8 = 0x40;
    pub const EXTENSION_DATA: u8 = 0x80;

    fn has(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    pub fn user_present(self) -> bool {
        self.has(Self::USER_PRESENT)
    }

    pub fn user_verified(self) -> bool {
        self.has(Self::USER_VERIFIED)
    }

    pub fn backup_eligible(self) -> bool {
        self.has(Self::BACKUP_ELIGIBLE)
    }

    pub fn backed_up(self) -> bool {
        self.has(Self::BACKED_UP)
    }

    pub fn attested_credential_data(self) -> bool {
        self.has(Self::ATTESTED_CREDENTIAL_DATA)
    }

    pub fn extension_data(self) -> bool {
        self.has(Self::EXTENSION_DATA)
    }
}

/// Credential block present when the AT flag is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredentialData {
    pub aaguid: [u8; AAGUID_LEN],
    pub credential_id: Vec<u8>,
    pub credential_public_key: CoseKey,
}

/// Parsed authenticator data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; 32],
    pub flags: AuthenticatorFlags,
    pub sign_count: u32,
    pub attested_credential_data: Option<AttestedCredentialData>,
    /// Raw extension outputs; not interpreted
    pub extensions: Option<Vec<u8>>,
}

impl AuthenticatorData {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_AUTH_DATA_LEN {
            return Err(malformed(format!(
                "{} bytes, need at least {MIN_AUTH_DATA_LEN}",
                bytes.len()
            )));
        }

        let mut rp_id_hash = [0u8; 32];
        rp_id_hash.copy_from_slice(&bytes[..32]);
        let flags = AuthenticatorFlags(bytes[32]);
        let sign_count = u32::from_be_bytes([bytes[33], bytes[34], bytes[35], bytes[36]]);

        let mut rest = &bytes[MIN_AUTH_DATA_LEN..];
        let attested_credential_data = if flags.attested_credential_data() {
            let (data, tail) = parse_attested_credential_data(rest)?;
            rest = tail;
            Some(data)
        } else {
            None
        };

        let extensions = match (flags.extension_data(), rest.is_empty()) {
            (true, true) => return Err(malformed("ED flag set but no extension data".into())),
            (true, false) => {
                let mut reader = CborReader::new(rest);
                if reader.read_map_len().is_err() {
                    return Err(malformed("extension data is not a CBOR map".into()));
                }
                tracing::debug!(len = rest.len(), "Ignoring authenticator extension outputs");
                Some(rest.to_vec())
            }
            (false, true) => None,
            (false, false) => {
                return Err(malformed(format!(
                    "{} unexpected trailing bytes",
                    rest.len()
                )))
            }
        };

        Ok(Self {
            rp_id_hash,
            flags,
            sign_count,
            attested_credential_data,
            extensions,
        })
    }

    /// Whether `rpIdHash` equals `SHA-256(rp_id)`.
    pub fn matches_rp_id(&self, rp_id: &str) -> bool {
        let expected = Sha256::digest(rp_id.as_bytes());
        expected.as_slice() == self.rp_id_hash.as_slice()
    }
}

fn malformed(message: String) -> CeremonyError {
    CeremonyError::MalformedAuthenticatorData(message)
}

fn parse_attested_credential_data(bytes: &[u8]) -> Result<(AttestedCredentialData, &[u8])> {
    if bytes.len() < AAGUID_LEN + 2 {
        return Err(malformed("truncated attested credential data".into()));
    }
    let mut aaguid = [0u8; AAGUID_LEN];
    aaguid.copy_from_slice(&bytes[..AAGUID_LEN]);

    let id_len = usize::from(u16::from_be_bytes([bytes[AAGUID_LEN], bytes[AAGUID_LEN + 1]]));
    if id_len == 0 || id_len > MAX_CREDENTIAL_ID_LEN {
        return Err(malformed(format!("credential ID length {id_len} out of range")));
    }
    let id_start = AAGUID_LEN + 2;
    let key_start = id_start + id_len;
    if bytes.len() <= key_start {
        return Err(malformed(format!(
            "credential ID length {id_len} exceeds remaining {} bytes",
            bytes.len() - id_start
        )));
    }
    let credential_id = bytes[id_start..key_start].to_vec();

    // The key's extent comes from its own CBOR structure; extensions may follow.
    let mut reader = CborReader::new(&bytes[key_start..]);
    let key_bytes = reader
        .read_raw_item()
        .map_err(|e| malformed(format!("credential public key: {e}")))?;
    let credential_public_key = CoseKey::decode(key_bytes)?;

    Ok((
        AttestedCredentialData {
            aaguid,
            credential_id,
            credential_public_key,
        },
        reader.remaining(),
    ))
}
