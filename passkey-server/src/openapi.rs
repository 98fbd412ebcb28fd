//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3 document served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::handlers::{HealthResponse, ReadyResponse};
use crate::webauthn::{
    AuthenticationResponseBody, RegisteredCredentialResponse, StartAuthenticationRequest,
    StartRegistrationRequest,
};

/// Passkey API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Passkey API",
        version = "0.1.0",
        description = r#"
## WebAuthn / FIDO2 Relying Party API

Passwordless sign-in with platform authenticators and security keys.

### How It Works

1. **Start registration** via `POST /webauthn/register/start` and pass `public_key`
   to `navigator.credentials.create()`
2. **Finish registration** by posting the resulting credential to `POST /webauthn/register/finish`
3. **Start authentication** via `POST /webauthn/authenticate/start` and pass `public_key`
   to `navigator.credentials.get()`
4. **Finish authentication** by posting the assertion to `POST /webauthn/authenticate/finish`

Every challenge is single-use and expires after a short TTL. Binary fields are
unpadded base64url. Supported algorithms are ES256 (-7) and RS256 (-257).

### Errors

Error responses carry `{"error": "...", "code": "..."}` where `code` is stable,
for example `CHALLENGE_NOT_FOUND`, `ORIGIN_MISMATCH` or `COUNTER_REGRESSION`.
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "WebAuthn", description = "Passkey registration and authentication ceremonies"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::webauthn::handlers::start_registration,
        crate::webauthn::handlers::finish_registration,
        crate::webauthn::handlers::start_authentication,
        crate::webauthn::handlers::finish_authentication,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            StartRegistrationRequest,
            StartAuthenticationRequest,
            RegisteredCredentialResponse,
            AuthenticationResponseBody,
        )
    )
)]
pub struct ApiDoc;
