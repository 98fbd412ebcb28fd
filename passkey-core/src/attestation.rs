//! Attestation object decoding.
//!
//! The attestation object is a three-entry CBOR map (`fmt`, `attStmt`,
//! `authData`). Entries are visited in the order they appear; the attestation
//! statement is kept as an opaque CBOR span because attestation trust chains
//! are not verified.

use crate::cbor::{CborReader, DecodeError, MajorType, MapKey};
use crate::error::{CeremonyError, Result};

/// Attestation format reported when the authenticator makes no attestation claim.
pub const FORMAT_NONE: &str = "none";

/// Decoded attestation object borrowing from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationObject<'a> {
    /// Attestation statement format identifier (`"none"`, `"packed"`, ...)
    pub fmt: &'a str,
    /// Raw authenticator data
    pub auth_data: &'a [u8],
    /// Raw CBOR encoding of the attestation statement map
    pub att_stmt: &'a [u8],
}

impl<'a> AttestationObject<'a> {
    /// Decode an attestation object.
    ///
    /// Unknown text keys are skipped. Missing or repeated required keys,
    /// non-text keys and trailing bytes are rejected.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        Self::decode(bytes).map_err(|e| CeremonyError::MalformedAttestationObject(e.to_string()))
    }

    fn decode(bytes: &'a [u8]) -> std::result::Result<Self, AttestationDecodeError> {
        let mut reader = CborReader::new(bytes);
        let entries = reader.read_map_len()?;

        let mut fmt = None;
        let mut auth_data = None;
        let mut att_stmt = None;

        for _ in 0..entries {
            let offset = reader.position();
            let key = match reader.read_key()? {
                MapKey::Text(key) => key,
                MapKey::Int(_) => return Err(AttestationDecodeError::NonTextKey(offset)),
            };

            match key {
                "fmt" => set_once(&mut fmt, reader.read_text()?, "fmt")?,
                "authData" => set_once(&mut auth_data, reader.read_bytes()?, "authData")?,
                "attStmt" => {
                    if reader.peek_major()? != MajorType::Map {
                        return Err(AttestationDecodeError::AttStmtNotMap);
                    }
                    set_once(&mut att_stmt, reader.read_raw_item()?, "attStmt")?
                }
                other => {
                    tracing::debug!(key = other, "Skipping unknown attestation object entry");
                    reader.skip_item()?;
                }
            }
        }
        reader.finish()?;

        Ok(Self {
            fmt: fmt.ok_or(AttestationDecodeError::Missing("fmt"))?,
            auth_data: auth_data.ok_or(AttestationDecodeError::Missing("authData"))?,
            att_stmt: att_stmt.ok_or(AttestationDecodeError::Missing("attStmt"))?,
        })
    }
}

fn set_once<T>(
    slot: &mut Option<T>,
    value: T,
    name: &'static str,
) -> std::result::Result<(), AttestationDecodeError> {
    if slot.replace(value).is_some() {
        return Err(AttestationDecodeError::Duplicate(name));
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
enum AttestationDecodeError {
    #[error(transparent)]
    Cbor(#[from] DecodeError),

    #[error("map key at offset {0} is not a text string")]
    NonTextKey(usize),

    #[error("attStmt is not a map")]
    AttStmtNotMap,

    #[error("missing required entry {0}")]
    Missing(&'static str),

    #[error("entry {0} appears more than once")]
    Duplicate(&'static str),
}
