//! Authentication module - Refresh-token storage
//!
//! The session credential is a single refresh token kept in:
//! - the platform credential manager (via the keyring crate)
//! - process memory, for tests and throwaway sessions

mod token_store;

pub use token_store::{
    KeyringTokenStore, MemoryTokenStore, TokenStore, TokenStoreError, DEFAULT_SERVICE,
    REFRESH_TOKEN_KEY,
};

#[cfg(test)]
pub use token_store::MockTokenStore;
