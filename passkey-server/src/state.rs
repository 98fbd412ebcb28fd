//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use passkey_core::{RelyingParty, RelyingPartyConfig};

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Ceremony engine with its challenge and credential stores
    pub relying_party: Arc<RelyingParty>,
    /// Whether credentials survive a restart
    pub persistent: bool,
}

impl AppState {
    pub fn new(relying_party: RelyingParty, persistent: bool) -> Self {
        Self {
            relying_party: Arc::new(relying_party),
            persistent,
        }
    }

    /// State backed entirely by memory (for testing and development)
    pub fn in_memory(config: RelyingPartyConfig) -> Self {
        Self::new(RelyingParty::in_memory(config), false)
    }

    /// Name of the credential backend, as reported by `/health`
    pub fn storage_backend(&self) -> &'static str {
        if self.persistent {
            "postgres"
        } else {
            "memory"
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("relying_party", &self.relying_party)
            .field("storage", &self.storage_backend())
            .finish()
    }
}
