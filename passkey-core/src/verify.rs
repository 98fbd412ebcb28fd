//! Assertion signature verification.
//!
//! The signed message is `authenticatorData || SHA-256(clientDataJSON)`.
//! Key reconstruction and signature checking fail with different kinds:
//! key material that cannot form a verifier key is `MalformedCoseKey`,
//! anything wrong with the signature itself is `SignatureInvalid`.

use p256::ecdsa::signature::Verifier as _;
use p256::EncodedPoint;
use rsa::{pkcs1v15, BigUint, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::cose::{CoseAlgorithm, CoseKey};
use crate::error::{CeremonyError, Result};

/// Verifier-ready public key.
#[derive(Debug, Clone)]
pub enum PublicKey {
    Es256(p256::ecdsa::VerifyingKey),
    Rs256(pkcs1v15::VerifyingKey<Sha256>),
}

impl PublicKey {
    /// Reconstruct a verifying key from decoded COSE key material.
    pub fn from_cose(key: &CoseKey) -> Result<Self> {
        match key {
            CoseKey::Ec2 { x, y, .. } => {
                let point = EncodedPoint::from_affine_coordinates(x.into(), y.into(), false);
                p256::ecdsa::VerifyingKey::from_encoded_point(&point)
                    .map(PublicKey::Es256)
                    .map_err(|_| {
                        CeremonyError::MalformedCoseKey("point is not on the P-256 curve".into())
                    })
            }
            CoseKey::Rsa { n, e } => {
                let key = RsaPublicKey::new(BigUint::from_bytes_be(n), BigUint::from_bytes_be(e))
                    .map_err(|err| CeremonyError::MalformedCoseKey(format!("RSA key: {err}")))?;
                Ok(PublicKey::Rs256(pkcs1v15::VerifyingKey::new(key)))
            }
        }
    }

    pub fn algorithm(&self) -> CoseAlgorithm {
        match self {
            PublicKey::Es256(_) => CoseAlgorithm::Es256,
            PublicKey::Rs256(_) => CoseAlgorithm::Rs256,
        }
    }
}

/// Build `authenticatorData || SHA-256(clientDataJSON)`.
pub fn signed_data(authenticator_data: &[u8], client_data_json: &[u8]) -> Vec<u8> {
    let client_data_hash = Sha256::digest(client_data_json);
    let mut message = Vec::with_capacity(authenticator_data.len() + client_data_hash.len());
    message.extend_from_slice(authenticator_data);
    message.extend_from_slice(&client_data_hash);
    message
}

/// Verify an assertion signature using the algorithm recorded for the credential.
///
/// `algorithm` is the raw COSE identifier stored at registration time.
pub fn verify_assertion(
    algorithm: i64,
    key: &CoseKey,
    authenticator_data: &[u8],
    client_data_json: &[u8],
    signature: &[u8],
) -> Result<()> {
    let algorithm = CoseAlgorithm::from_id(algorithm)?;
    let public_key = PublicKey::from_cose(key)?;
    let message = signed_data(authenticator_data, client_data_json);

    let verified = match (algorithm, &public_key) {
        (CoseAlgorithm::Es256, PublicKey::Es256(key)) => {
            p256::ecdsa::DerSignature::from_bytes(signature)
                .ok()
                .and_then(|sig| key.verify(&message, &sig).ok())
                .is_some()
        }
        (CoseAlgorithm::Rs256, PublicKey::Rs256(key)) => {
            pkcs1v15::Signature::try_from(signature)
                .ok()
                .and_then(|sig| key.verify(&message, &sig).ok())
                .is_some()
        }
        (dispatched, key) => {
            tracing::debug!(
                dispatched = dispatched.as_str(),
                key = key.algorithm().as_str(),
                "Key family does not match dispatched algorithm"
            );
            false
        }
    };

    if verified {
        Ok(())
    } else {
        Err(CeremonyError::SignatureInvalid)
    }
}
