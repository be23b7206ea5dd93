//! Refresh-token persistence
//!
//! A session is a single refresh token stored under a fixed key. The
//! [`TokenStore`] trait is the seam between the HTTP layer and wherever
//! that token lives: the platform credential manager in production
//! ([`KeyringTokenStore`]) or process memory ([`MemoryTokenStore`]).

use std::sync::RwLock;

use keyring::Entry;
use thiserror::Error;

use crate::security::SecretToken;

/// Key the refresh token is stored under
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Default credential-manager service name
pub const DEFAULT_SERVICE: &str = "CreativeMonitor";

/// Errors that can occur during token storage operations
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// Keyring operation failed
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Store lock was poisoned by a panicking writer
    #[error("Token store lock poisoned")]
    Poisoned,
}

/// Storage for the single refresh token of a session
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore: Send + Sync {
    /// Returns the stored token, `None` when there is no session
    fn get(&self) -> Result<Option<SecretToken>, TokenStoreError>;

    /// Stores `token`, replacing any previous value
    fn set(&self, token: &str) -> Result<(), TokenStoreError>;

    /// Removes the stored token
    ///
    /// Returns `true` if a token was present.
    fn clear(&self) -> Result<bool, TokenStoreError>;

    fn contains(&self) -> Result<bool, TokenStoreError> {
        Ok(self.get()?.is_some())
    }
}

/// Token store backed by the platform credential manager
///
/// Windows Credential Manager, macOS Keychain or the Linux kernel keyring,
/// depending on the target. The token is tied to the current OS user.
pub struct KeyringTokenStore {
    service: String,
    key: String,
}

impl KeyringTokenStore {
    /// Creates a store with the default service name
    pub fn new() -> Self {
        Self::with_service(DEFAULT_SERVICE)
    }

    /// Creates a store under a custom service name
    ///
    /// Separate service names keep separate sessions, e.g. one per API
    /// environment.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            key: REFRESH_TOKEN_KEY.to_string(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn entry(&self) -> Result<Entry, TokenStoreError> {
        Ok(Entry::new(&self.service, &self.key)?)
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Result<Option<SecretToken>, TokenStoreError> {
        match self.entry()?.get_password() {
            Ok(password) => Ok(Some(SecretToken::new(password))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(TokenStoreError::Keyring(e)),
        }
    }

    fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        self.entry()?.set_password(token)?;
        Ok(())
    }

    fn clear(&self) -> Result<bool, TokenStoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(TokenStoreError::Keyring(e)),
        }
    }
}

/// In-process token store
///
/// Nothing survives the process. Used for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<SecretToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `token`
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(SecretToken::new(token.into()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<SecretToken>, TokenStoreError> {
        let guard = self.token.read().map_err(|_| TokenStoreError::Poisoned)?;
        Ok(guard.clone())
    }

    fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        let mut guard = self.token.write().map_err(|_| TokenStoreError::Poisoned)?;
        *guard = Some(SecretToken::from(token));
        Ok(())
    }

    fn clear(&self) -> Result<bool, TokenStoreError> {
        let mut guard = self.token.write().map_err(|_| TokenStoreError::Poisoned)?;
        Ok(guard.take().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyring_store_creation() {
        let store = KeyringTokenStore::new();
        assert_eq!(store.service(), "CreativeMonitor");
        assert_eq!(store.key(), "refresh_token");

        let custom = KeyringTokenStore::with_service("CreativeMonitor-Staging");
        assert_eq!(custom.service(), "CreativeMonitor-Staging");
        assert_eq!(custom.key(), REFRESH_TOKEN_KEY);
    }

    #[test]
    fn test_memory_store_starts_empty() {
        let store = MemoryTokenStore::new();
        assert!(store.get().unwrap().is_none());
        assert!(!store.contains().unwrap());
    }

    #[test]
    fn test_memory_store_set_and_get() {
        let store = MemoryTokenStore::new();
        store.set("tok1").unwrap();
        assert_eq!(store.get().unwrap().unwrap().expose(), "tok1");
        assert!(store.contains().unwrap());
    }

    #[test]
    fn test_memory_store_overwrite() {
        let store = MemoryTokenStore::with_token("first");
        store.set("second").unwrap();
        assert_eq!(store.get().unwrap().unwrap().expose(), "second");
    }

    #[test]
    fn test_memory_store_clear() {
        let store = MemoryTokenStore::with_token("tok");
        assert!(store.clear().unwrap());
        assert!(store.get().unwrap().is_none());

        // Clearing twice reports nothing was there
        assert!(!store.clear().unwrap());
    }
}
