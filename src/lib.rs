//! Creative Monitor - Client for the advertising creatives analytics API
//!
//! Typed access to the API behind the creatives dashboard: categories,
//! brands, creatives and their weekly statistics, the user profile, and
//! the session lifecycle.
//!
//! ## Features
//!
//! - Cookie-based sessions with a long-lived refresh token
//! - Transparent session refresh: a request that gets 401 triggers one
//!   refresh (shared by every request failing at the same time) and is
//!   replayed once
//! - Refresh token kept in the platform credential manager
//!   (Windows Credential Manager, macOS Keychain, Linux keyring)
//! - Tokens redacted in logs and zeroed in memory when dropped
//!
//! ## Architecture
//!
//! - **Http**: [`AuthenticatedClient`] and the refresh single-flight
//! - **Auth**: refresh-token storage behind the [`TokenStore`] trait
//! - **Api**: session, creative and profile services
//! - **Security**: secret handling, redaction, input validation

pub mod api;
pub mod auth;
pub mod config;
pub mod http;
pub mod security;

pub use api::{ApiError, CreativeService, ProfileService, SessionService};
pub use auth::{KeyringTokenStore, MemoryTokenStore, TokenStore};
pub use config::ClientConfig;
pub use http::{AuthenticatedClient, FetchError, FetchRequest, RefreshError};

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Default log directives when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "creative_monitor=debug,info";

/// Client and services sharing one session
pub struct AppState {
    /// Shared client; its refresh state covers every service below
    pub client: Arc<AuthenticatedClient>,
    pub session: SessionService,
    pub creatives: CreativeService,
    pub profile: ProfileService,
}

impl AppState {
    /// Wires the services to a client built from `config` and `store`
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, FetchError> {
        let client = Arc::new(AuthenticatedClient::new(config, store)?);

        Ok(Self {
            session: SessionService::new(client.clone()),
            creatives: CreativeService::new(client.clone()),
            profile: ProfileService::new(client.clone()),
            client,
        })
    }

    /// Like [`AppState::new`] with the refresh token in the platform
    /// credential manager under `config.keyring_service`
    pub fn with_keyring(config: ClientConfig) -> Result<Self, FetchError> {
        let store = Arc::new(KeyringTokenStore::with_service(config.keyring_service.clone()));
        Self::new(config, store)
    }
}

/// Installs the global tracing subscriber
///
/// Honors `RUST_LOG`; falls back to debug output for this crate. Calling
/// it twice is harmless.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_shares_client() {
        let state = AppState::new(
            ClientConfig::with_api_url("http://localhost:8000"),
            Arc::new(MemoryTokenStore::with_token("tok")),
        )
        .unwrap();

        // One client instance: services + the field itself
        assert_eq!(Arc::strong_count(&state.client), 4);
        assert!(state.session.has_session().unwrap());
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }
}
