use thiserror::Error;

/// Terminal failure of a registration or authentication ceremony.
///
/// Every rejection has its own variant so callers can log, rate-limit or
/// alert per cause. None of them are retried inside the ceremony.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CeremonyError {
    /// The challenge was never issued, has expired, or was already used.
    #[error("Challenge not found")]
    ChallengeNotFound,

    #[error("Client data type mismatch: expected {expected}, got {actual}")]
    ClientDataTypeMismatch {
        expected: &'static str,
        actual: String,
    },

    #[error("Origin mismatch: {0}")]
    OriginMismatch(String),

    #[error("RP ID hash does not match the relying party")]
    RpIdHashMismatch,

    #[error("User presence flag not set")]
    UserPresenceMissing,

    #[error("Malformed client data: {0}")]
    MalformedClientData(String),

    #[error("Malformed attestation object: {0}")]
    MalformedAttestationObject(String),

    #[error("Malformed authenticator data: {0}")]
    MalformedAuthenticatorData(String),

    #[error("Malformed COSE key: {0}")]
    MalformedCoseKey(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(i64),

    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("Sign counter regression: stored={stored}, received={received}")]
    CounterRegression { stored: u32, received: u32 },

    #[error("Credential not found")]
    CredentialNotFound,

    #[error("Credential already registered")]
    DuplicateCredential,

    #[error("Credential storage error: {0}")]
    Storage(String),
}

impl CeremonyError {
    /// Whether this failure points at a cloned authenticator or tampered
    /// payload rather than ordinary user error.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            Self::SignatureInvalid | Self::CounterRegression { .. }
        )
    }

    /// Stable machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChallengeNotFound => "challenge_not_found",
            Self::ClientDataTypeMismatch { .. } => "client_data_type_mismatch",
            Self::OriginMismatch(_) => "origin_mismatch",
            Self::RpIdHashMismatch => "rp_id_hash_mismatch",
            Self::UserPresenceMissing => "user_presence_missing",
            Self::MalformedClientData(_) => "malformed_client_data",
            Self::MalformedAttestationObject(_) => "malformed_attestation_object",
            Self::MalformedAuthenticatorData(_) => "malformed_authenticator_data",
            Self::MalformedCoseKey(_) => "malformed_cose_key",
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::SignatureInvalid => "signature_invalid",
            Self::CounterRegression { .. } => "counter_regression",
            Self::CredentialNotFound => "credential_not_found",
            Self::DuplicateCredential => "duplicate_credential",
            Self::Storage(_) => "storage",
        }
    }
}

pub type Result<T> = std::result::Result<T, CeremonyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_events() {
        assert!(CeremonyError::SignatureInvalid.is_security_event());
        assert!(CeremonyError::CounterRegression {
            stored: 5,
            received: 3
        }
        .is_security_event());
        assert!(!CeremonyError::ChallengeNotFound.is_security_event());
        assert!(!CeremonyError::MalformedCoseKey("kty".into()).is_security_event());
    }

    #[test]
    fn test_counter_regression_message() {
        let err = CeremonyError::CounterRegression {
            stored: 5,
            received: 3,
        };
        assert_eq!(
            err.to_string(),
            "Sign counter regression: stored=5, received=3"
        );
        assert_eq!(err.kind(), "counter_regression");
    }
}
