//! WebAuthn HTTP endpoint handlers
//!
//! Implements the registration and authentication flows. Every ceremony check
//! happens in [`passkey_core::RelyingParty`]; these handlers only translate
//! between JSON and the core types.

use axum::{extract::State, Json};
use passkey_core::{
    base64url, AuthenticationResponse, NewUser, RegistrationResponse, MAX_USER_ID_LEN,
};

use super::types::{
    AuthenticationResponseBody, RegisteredCredentialResponse, StartAuthenticationRequest,
    StartAuthenticationResponse, StartRegistrationRequest, StartRegistrationResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

fn decode_user_id(user_id: &str) -> Result<Vec<u8>, ApiError> {
    let bytes = base64url::decode(user_id)
        .map_err(|e| ApiError::bad_request(format!("user_id is not base64url: {e}")))?;
    if bytes.is_empty() || bytes.len() > MAX_USER_ID_LEN {
        return Err(ApiError::bad_request(format!(
            "user_id must be 1 to {MAX_USER_ID_LEN} bytes"
        )));
    }
    Ok(bytes)
}

/// POST /webauthn/register/start
///
/// Start passkey registration for a new user. The user handle is always
/// generated server-side. Returns options whose challenge must be signed by the authenticator.
#[utoipa::path(
    post,
    path = "/webauthn/register/start",
    tag = "WebAuthn",
    request_body = StartRegistrationRequest,
    responses(
        (status = 200, description = "Registration challenge created (JSON with public_key creation options)"),
        (status = 400, description = "Empty username"),
        (status = 503, description = "Credential storage unavailable")
    )
)]
pub async fn start_registration(
    State(state): State<AppState>,
    Json(req): Json<StartRegistrationRequest>,
) -> Result<Json<StartRegistrationResponse>, ApiError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(ApiError::bad_request("username must not be empty"));
    }

    // New accounts only; the handle is never taken from the request.
    let id = uuid::Uuid::new_v4().as_bytes().to_vec();
    let display_name = req
        .display_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| username.to_string());

    let options = state
        .relying_party
        .begin_registration(NewUser {
            id,
            name: username.to_string(),
            display_name,
        })
        .await?;

    tracing::info!(username = %username, "WebAuthn registration started");

    Ok(Json(StartRegistrationResponse {
        public_key: options,
    }))
}

/// POST /webauthn/register/finish
///
/// Complete registration with the authenticator's response.
///
/// Request body is the `PublicKeyCredential` returned by `navigator.credentials.create()`,
/// with binary fields base64url-encoded.
#[utoipa::path(
    post,
    path = "/webauthn/register/finish",
    tag = "WebAuthn",
    request_body(content_type = "application/json", description = "Registration response from browser"),
    responses(
        (status = 200, description = "Registration completed", body = RegisteredCredentialResponse),
        (status = 400, description = "Invalid, expired or tampered ceremony"),
        (status = 409, description = "Credential already registered"),
        (status = 503, description = "Credential storage unavailable")
    )
)]
pub async fn finish_registration(
    State(state): State<AppState>,
    Json(req): Json<RegistrationResponse>,
) -> Result<Json<RegisteredCredentialResponse>, ApiError> {
    let credential = state.relying_party.finish_registration(&req).await?;
    Ok(Json(credential.into()))
}

/// POST /webauthn/authenticate/start
///
/// Start authentication. With a `user_id` the options list that user's
/// credentials; without one the browser may offer any discoverable credential.
#[utoipa::path(
    post,
    path = "/webauthn/authenticate/start",
    tag = "WebAuthn",
    request_body = StartAuthenticationRequest,
    responses(
        (status = 200, description = "Authentication challenge created (JSON with public_key request options)"),
        (status = 400, description = "Invalid user handle"),
        (status = 404, description = "User has no registered credentials")
    )
)]
pub async fn start_authentication(
    State(state): State<AppState>,
    Json(req): Json<StartAuthenticationRequest>,
) -> Result<Json<StartAuthenticationResponse>, ApiError> {
    let user_id = req.user_id.as_deref().map(decode_user_id).transpose()?;

    let options = state
        .relying_party
        .begin_authentication(user_id.as_deref())
        .await?;

    tracing::info!(
        allowed_credentials = options.allow_credentials.len(),
        "WebAuthn authentication started"
    );

    Ok(Json(StartAuthenticationResponse {
        public_key: options,
    }))
}

/// POST /webauthn/authenticate/finish
///
/// Verify an assertion and advance the credential's signature counter.
///
/// Request body is the `PublicKeyCredential` returned by `navigator.credentials.get()`,
/// with binary fields base64url-encoded.
#[utoipa::path(
    post,
    path = "/webauthn/authenticate/finish",
    tag = "WebAuthn",
    request_body(content_type = "application/json", description = "Authentication response from browser"),
    responses(
        (status = 200, description = "Authentication verified", body = AuthenticationResponseBody),
        (status = 400, description = "Invalid, expired or tampered ceremony"),
        (status = 401, description = "Signature invalid or counter regression"),
        (status = 404, description = "Unknown credential")
    )
)]
pub async fn finish_authentication(
    State(state): State<AppState>,
    Json(req): Json<AuthenticationResponse>,
) -> Result<Json<AuthenticationResponseBody>, ApiError> {
    let result = state.relying_party.finish_authentication(&req).await?;
    Ok(Json(result.into()))
}
