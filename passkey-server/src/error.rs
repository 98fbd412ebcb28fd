//! API error handling module
//!
//! Provides a unified error type for all API endpoints. Ceremony failures keep
//! their kind as a stable `code` so clients can react programmatically.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use passkey_core::CeremonyError;
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rejected registration or authentication ceremony
    #[error(transparent)]
    Ceremony(#[from] CeremonyError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Ceremony(e) => match e {
                // Cryptographic rejections and cloned authenticators → 401
                CeremonyError::SignatureInvalid | CeremonyError::CounterRegression { .. } => {
                    StatusCode::UNAUTHORIZED
                }
                CeremonyError::CredentialNotFound => StatusCode::NOT_FOUND,
                CeremonyError::DuplicateCredential => StatusCode::CONFLICT,
                CeremonyError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,

                // Everything else is a malformed or stale ceremony → 400
                CeremonyError::ChallengeNotFound
                | CeremonyError::ClientDataTypeMismatch { .. }
                | CeremonyError::OriginMismatch(_)
                | CeremonyError::RpIdHashMismatch
                | CeremonyError::UserPresenceMissing
                | CeremonyError::MalformedClientData(_)
                | CeremonyError::MalformedAttestationObject(_)
                | CeremonyError::MalformedAuthenticatorData(_)
                | CeremonyError::MalformedCoseKey(_)
                | CeremonyError::UnsupportedAlgorithm(_) => StatusCode::BAD_REQUEST,
            },
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> String {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT".to_string(),
            Self::Ceremony(e) => e.kind().to_ascii_uppercase(),
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            Self::Ceremony(CeremonyError::Storage(_)) => {
                "Credential storage unavailable".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Ceremony(_) => "ceremony",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Ceremony rejections are already logged by the relying party
        match &self {
            Self::BadRequest(_) => {
                tracing::warn!(
                    status = %status,
                    category = category,
                    code = %code,
                    error = %internal_message,
                    "Client error"
                );
            }
            Self::Ceremony(_) => {
                tracing::debug!(
                    status = %status,
                    code = %code,
                    "Ceremony rejected"
                );
            }
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceremony_status_codes() {
        let cases = [
            (CeremonyError::ChallengeNotFound, StatusCode::BAD_REQUEST),
            (CeremonyError::SignatureInvalid, StatusCode::UNAUTHORIZED),
            (
                CeremonyError::CounterRegression {
                    stored: 5,
                    received: 3,
                },
                StatusCode::UNAUTHORIZED,
            ),
            (CeremonyError::CredentialNotFound, StatusCode::NOT_FOUND),
            (CeremonyError::DuplicateCredential, StatusCode::CONFLICT),
            (
                CeremonyError::Storage("pool timed out".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                CeremonyError::MalformedCoseKey("kty".into()),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ApiError::from(CeremonyError::ChallengeNotFound).error_code(),
            "CHALLENGE_NOT_FOUND"
        );
        assert_eq!(
            ApiError::from(CeremonyError::UnsupportedAlgorithm(-8)).error_code(),
            "UNSUPPORTED_ALGORITHM"
        );
        assert_eq!(ApiError::bad_request("x").error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_storage_details_hidden_from_clients() {
        let err = ApiError::from(CeremonyError::Storage("password=hunter2".into()));
        assert!(!err.client_message().contains("hunter2"));
        assert_eq!(err.error_code(), "STORAGE");
    }
}
