//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.
//! Relying Party identity is configured separately through
//! [`RelyingPartyConfig::from_env`](passkey_core::RelyingPartyConfig::from_env).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Settings the server refuses to start with
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid rate limit settings: per_sec={per_sec}, burst={burst}")]
    RateLimit { per_sec: u64, burst: u32 },
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Server bind address (default: 127.0.0.1)
    pub host: IpAddr,
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in KB (default: 64)
    pub body_limit_kb: usize,
    /// Request timeout in seconds (default: 10)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// PostgreSQL URL for credential storage; in-memory when unset
    pub database_url: Option<String>,
    /// Database connection pool maximum connections (default: 10)
    pub database_max_connections: u32,
    /// How often expired challenges are purged, in seconds (default: 30)
    pub challenge_purge_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_kb: 64,
            timeout_secs: 10,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            database_url: None,
            database_max_connections: 10,
            challenge_purge_interval_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env_parse("PORT").unwrap_or(defaults.port);
        let host = env_parse("HOST").unwrap_or(defaults.host);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Rate limiting enabled by default in production, can be disabled with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.is_empty());

        Self {
            port,
            host,
            allowed_origins,
            body_limit_kb: env_parse("BODY_LIMIT_KB").unwrap_or(defaults.body_limit_kb),
            timeout_secs: env_parse("REQUEST_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            rate_limit_enabled,
            rate_limit_per_sec: env_parse("RATE_LIMIT_PER_SEC")
                .unwrap_or(defaults.rate_limit_per_sec),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            database_url,
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            challenge_purge_interval_secs: env_parse("CHALLENGE_PURGE_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.challenge_purge_interval_secs),
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn challenge_purge_interval(&self) -> Duration {
        Duration::from_secs(self.challenge_purge_interval_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
