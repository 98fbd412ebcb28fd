//! Relying Party configuration
//!
//! Identity of the Relying Party (RP) plus the origins allowed to run
//! ceremonies against it.

use std::time::Duration;
use url::Url;

use crate::challenge::DEFAULT_CHALLENGE_TTL;

/// Default client-side timeout hint sent in ceremony options.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Longest challenge lifetime accepted from the environment.
pub const MAX_CHALLENGE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid origin URL: {0}")]
    InvalidOrigin(String),

    #[error("Origin {origin} is not within RP ID {rp_id}")]
    OriginOutsideRpId { origin: String, rp_id: String },

    #[error("RP ID must not be empty")]
    EmptyRpId,

    #[error("At least one origin is required")]
    NoOrigins,

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Relying Party configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelyingPartyConfig {
    rp_id: String,
    rp_name: String,
    origins: Vec<String>,
    challenge_ttl: Duration,
    timeout: Duration,
    allow_cross_origin: bool,
}

impl RelyingPartyConfig {
    /// Create a configuration.
    ///
    /// # Arguments
    ///
    /// * `rp_id` - Relying Party ID (a domain, e.g. `example.com`)
    /// * `rp_name` - Human-readable name shown by the authenticator
    /// * `origins` - Web origins allowed to run ceremonies; each host must
    ///   equal `rp_id` or be a subdomain of it
    pub fn new<I, S>(rp_id: &str, rp_name: &str, origins: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rp_id = rp_id.trim().to_ascii_lowercase();
        if rp_id.is_empty() {
            return Err(ConfigError::EmptyRpId);
        }

        let origins = origins
            .into_iter()
            .map(|origin| normalize_origin(origin.as_ref(), &rp_id))
            .collect::<Result<Vec<_>, _>>()?;
        if origins.is_empty() {
            return Err(ConfigError::NoOrigins);
        }

        Ok(Self {
            rp_id,
            rp_name: rp_name.to_string(),
            origins,
            challenge_ttl: DEFAULT_CHALLENGE_TTL,
            timeout: DEFAULT_TIMEOUT,
            allow_cross_origin: false,
        })
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `WEBAUTHN_RP_ID` - Relying Party ID (default: "localhost")
    /// - `WEBAUTHN_RP_ORIGIN` - comma-separated origins (default: "http://localhost:3000")
    /// - `WEBAUTHN_RP_NAME` - RP display name (default: "Passkey")
    /// - `WEBAUTHN_CHALLENGE_TTL_SECS` - challenge lifetime, 1 to 86400 (default: 60)
    /// - `WEBAUTHN_ALLOW_CROSS_ORIGIN` - accept `crossOrigin: true` (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let rp_id = std::env::var("WEBAUTHN_RP_ID").unwrap_or_else(|_| "localhost".to_string());
        let rp_origin = std::env::var("WEBAUTHN_RP_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let rp_name = std::env::var("WEBAUTHN_RP_NAME").unwrap_or_else(|_| "Passkey".to_string());

        let origins = rp_origin
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let mut config = Self::new(&rp_id, &rp_name, origins)?;

        if let Ok(value) = std::env::var("WEBAUTHN_CHALLENGE_TTL_SECS") {
            let secs = value
                .parse::<u64>()
                .ok()
                .filter(|secs| (1..=MAX_CHALLENGE_TTL.as_secs()).contains(secs))
                .ok_or(ConfigError::InvalidValue {
                    name: "WEBAUTHN_CHALLENGE_TTL_SECS",
                    value,
                })?;
            config.challenge_ttl = Duration::from_secs(secs);
        }

        if let Ok(value) = std::env::var("WEBAUTHN_ALLOW_CROSS_ORIGIN") {
            config.allow_cross_origin = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "WEBAUTHN_ALLOW_CROSS_ORIGIN",
                        value,
                    })
                }
            };
        }

        Ok(config)
    }

    pub fn with_challenge_ttl(mut self, ttl: Duration) -> Self {
        self.challenge_ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cross_origin(mut self, allow: bool) -> Self {
        self.allow_cross_origin = allow;
        self
    }

    pub fn rp_id(&self) -> &str {
        &self.rp_id
    }

    pub fn rp_name(&self) -> &str {
        &self.rp_name
    }

    /// Normalized allowed origins (`scheme://host[:port]`, no trailing slash).
    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    pub fn challenge_ttl(&self) -> Duration {
        self.challenge_ttl
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn allow_cross_origin(&self) -> bool {
        self.allow_cross_origin
    }
}

fn normalize_origin(origin: &str, rp_id: &str) -> Result<String, ConfigError> {
    let url = Url::parse(origin).map_err(|e| ConfigError::InvalidOrigin(format!("{origin}: {e}")))?;
    if !matches!(url.scheme(), "https" | "http") {
        return Err(ConfigError::InvalidOrigin(format!(
            "{origin}: scheme must be https or http"
        )));
    }
    let host = url
        .host_str()
        .ok_or_else(|| ConfigError::InvalidOrigin(format!("{origin}: missing host")))?;

    if host != rp_id && !host.ends_with(&format!(".{rp_id}")) {
        return Err(ConfigError::OriginOutsideRpId {
            origin: origin.to_string(),
            rp_id: rp_id.to_string(),
        });
    }

    Ok(url.origin().ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = RelyingPartyConfig::new(
            "example.com",
            "Example",
            ["https://example.com/", "https://login.example.com:8443"],
        )
        .unwrap();
        assert_eq!(config.rp_id(), "example.com");
        assert_eq!(
            config.origins(),
            ["https://example.com", "https://login.example.com:8443"]
        );
        assert_eq!(config.challenge_ttl(), DEFAULT_CHALLENGE_TTL);
        assert!(!config.allow_cross_origin());
    }

    #[test]
    fn test_default_port_is_dropped() {
        let config =
            RelyingPartyConfig::new("example.com", "Example", ["https://EXAMPLE.com:443"]).unwrap();
        assert_eq!(config.origins(), ["https://example.com"]);
    }

    #[test]
    fn test_origin_outside_rp_id() {
        let err = RelyingPartyConfig::new("example.com", "Example", ["https://notexample.com"])
            .unwrap_err();
        assert!(matches!(err, ConfigError::OriginOutsideRpId { .. }));
    }

    #[test]
    fn test_invalid_origins() {
        for origin in ["not a url", "ftp://example.com", "data:text/plain,hi"] {
            assert!(
                RelyingPartyConfig::new("example.com", "Example", [origin]).is_err(),
                "{origin} must be rejected"
            );
        }
        assert_eq!(
            RelyingPartyConfig::new("example.com", "Example", Vec::<String>::new()),
            Err(ConfigError::NoOrigins)
        );
        assert_eq!(
            RelyingPartyConfig::new(" ", "Example", ["https://example.com"]),
            Err(ConfigError::EmptyRpId)
        );
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the environment to avoid races between tests
        std::env::remove_var("WEBAUTHN_RP_ID");
        std::env::remove_var("WEBAUTHN_RP_ORIGIN");
        std::env::remove_var("WEBAUTHN_RP_NAME");
        std::env::remove_var("WEBAUTHN_CHALLENGE_TTL_SECS");
        std::env::remove_var("WEBAUTHN_ALLOW_CROSS_ORIGIN");

        let config = RelyingPartyConfig::from_env().unwrap();
        assert_eq!(config.rp_id(), "localhost");
        assert_eq!(config.origins(), ["http://localhost:3000"]);

        std::env::set_var("WEBAUTHN_RP_ID", "example.com");
        std::env::set_var(
            "WEBAUTHN_RP_ORIGIN",
            "https://example.com, https://app.example.com",
        );
        std::env::set_var("WEBAUTHN_CHALLENGE_TTL_SECS", "120");
        std::env::set_var("WEBAUTHN_ALLOW_CROSS_ORIGIN", "true");
        let config = RelyingPartyConfig::from_env().unwrap();
        assert_eq!(config.origins().len(), 2);
        assert_eq!(config.challenge_ttl(), Duration::from_secs(120));
        assert!(config.allow_cross_origin());

        for ttl in ["soon", "0", "86401", "18446744073709551615"] {
            std::env::set_var("WEBAUTHN_CHALLENGE_TTL_SECS", ttl);
            assert!(
                matches!(
                    RelyingPartyConfig::from_env(),
                    Err(ConfigError::InvalidValue { .. })
                ),
                "{ttl} must be rejected"
            );
        }

        std::env::remove_var("WEBAUTHN_RP_ID");
        std::env::remove_var("WEBAUTHN_RP_ORIGIN");
        std::env::remove_var("WEBAUTHN_CHALLENGE_TTL_SECS");
        std::env::remove_var("WEBAUTHN_ALLOW_CROSS_ORIGIN");
    }
}
