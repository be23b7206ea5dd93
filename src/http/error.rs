//! Error types for authenticated requests and session refresh

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Why a session refresh failed
///
/// One refresh outcome is handed to every request queued behind it, so
/// this type is `Clone`.
#[derive(Debug, Error, Clone)]
pub enum RefreshError {
    /// No refresh token is stored; nothing to exchange
    #[error("No refresh token available")]
    NoCredential,

    /// Refresh endpoint answered with a non-success status
    #[error("Refresh rejected with status {status}")]
    Rejected { status: u16 },

    /// Transport failure while calling the refresh endpoint
    #[error("Network error during refresh: {0}")]
    Network(#[source] Arc<reqwest::Error>),

    /// Refresh endpoint answered 2xx with a body we could not read
    #[error("Invalid refresh response: {0}")]
    InvalidResponse(String),

    /// Refresh endpoint did not answer in time
    #[error("Refresh timed out after {0:?}")]
    Timeout(Duration),

    /// Token store could not be read or written
    #[error("Token store error: {0}")]
    Storage(String),

    /// The request driving the refresh was dropped before it settled
    #[error("Refresh was interrupted")]
    Interrupted,
}

/// Errors returned by [`AuthenticatedClient::request`](super::AuthenticatedClient::request)
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or request construction error
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Got 401 and the session could not be refreshed
    #[error("Session refresh failed: {0}")]
    Refresh(#[from] RefreshError),

    /// Got 401 again on the request replayed after a successful refresh
    #[error("Unauthorized after session refresh")]
    Unauthorized,
}

impl FetchError {
    /// True when the session is gone and the user has to log in again
    pub fn is_session_lost(&self) -> bool {
        matches!(self, FetchError::Refresh(_) | FetchError::Unauthorized)
    }
}
