//! `clientDataJSON` parsing and validation.

use serde::{Deserialize, Serialize};

use crate::error::{CeremonyError, Result};

/// `type` value of a registration ceremony's client data.
pub const TYPE_CREATE: &str = "webauthn.create";
/// `type` value of an authentication ceremony's client data.
pub const TYPE_GET: &str = "webauthn.get";

/// Collected client data as signed over by the authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientData {
    #[serde(rename = "type")]
    pub ceremony_type: String,
    /// Base64url challenge, compared verbatim against issued challenges
    pub challenge: String,
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_origin: Option<String>,
}

impl ClientData {
    /// Parse the raw UTF-8 JSON bytes. Unknown members are ignored.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| CeremonyError::MalformedClientData(e.to_string()))
    }

    pub fn require_type(&self, expected: &'static str) -> Result<()> {
        if self.ceremony_type != expected {
            return Err(CeremonyError::ClientDataTypeMismatch {
                expected,
                actual: self.ceremony_type.clone(),
            });
        }
        Ok(())
    }

    /// Require an exact match against one of `allowed`.
    ///
    /// Cross-origin client data (an iframe embedding) is rejected unless
    /// `allow_cross_origin` is set.
    pub fn require_origin<S: AsRef<str>>(&self, allowed: &[S], allow_cross_origin: bool) -> Result<()> {
        if !allowed.iter().any(|origin| origin.as_ref() == self.origin) {
            return Err(CeremonyError::OriginMismatch(self.origin.clone()));
        }
        if self.cross_origin == Some(true) && !allow_cross_origin {
            return Err(CeremonyError::OriginMismatch(format!(
                "{} (cross-origin, top origin {})",
                self.origin,
                self.top_origin.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[&str] = &["https://example.com"];

    #[test]
    fn test_parse_minimal() {
        let data = ClientData::parse(
            br#"{"type":"webauthn.get","challenge":"abc","origin":"https://example.com"}"#,
        )
        .unwrap();
        assert_eq!(data.ceremony_type, TYPE_GET);
        assert_eq!(data.challenge, "abc");
        assert_eq!(data.cross_origin, None);
        data.require_type(TYPE_GET).unwrap();
        data.require_origin(ALLOWED, false).unwrap();
    }

    #[test]
    fn test_unknown_members_ignored() {
        let data = ClientData::parse(
            br#"{"type":"webauthn.create","challenge":"x","origin":"https://example.com","other_keys_can_be_added_here":"do not compare clientDataJSON against a template"}"#,
        )
        .unwrap();
        assert_eq!(data.ceremony_type, TYPE_CREATE);
    }

    #[test]
    fn test_malformed() {
        for input in [&b"not json"[..], br#"{"type":"webauthn.get"}"#, b"\xff\xfe"] {
            assert!(matches!(
                ClientData::parse(input),
                Err(CeremonyError::MalformedClientData(_))
            ));
        }
    }

    #[test]
    fn test_type_mismatch() {
        let data = ClientData::parse(
            br#"{"type":"webauthn.create","challenge":"x","origin":"https://example.com"}"#,
        )
        .unwrap();
        assert_eq!(
            data.require_type(TYPE_GET),
            Err(CeremonyError::ClientDataTypeMismatch {
                expected: TYPE_GET,
                actual: TYPE_CREATE.to_string()
            })
        );
    }

    #[test]
    fn test_origin_must_match_exactly() {
        for origin in [
            "https://example.com/",
            "http://example.com",
            "https://example.com:8443",
            "https://evil.example.com",
            "https://EXAMPLE.com",
        ] {
            let json = format!(
                r#"{{"type":"webauthn.get","challenge":"x","origin":"{origin}"}}"#
            );
            let data = ClientData::parse(json.as_bytes()).unwrap();
            assert!(
                matches!(
                    data.require_origin(ALLOWED, false),
                    Err(CeremonyError::OriginMismatch(_))
                ),
                "{origin} must be rejected"
            );
        }
    }

    #[test]
    fn test_cross_origin_policy() {
        let data = ClientData::parse(
            br#"{"type":"webauthn.get","challenge":"x","origin":"https://example.com","crossOrigin":true,"topOrigin":"https://other.test"}"#,
        )
        .unwrap();
        assert!(matches!(
            data.require_origin(ALLOWED, false),
            Err(CeremonyError::OriginMismatch(m)) if m.contains("other.test")
        ));
        data.require_origin(ALLOWED, true).unwrap();
    }
}
