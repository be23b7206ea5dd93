//! Credential strings that clear their memory when dropped
//!
//! Refresh tokens pass through several owners (token store, refresh
//! request body, response parsing). Wrapping them in [`SecretToken`] keeps
//! them out of `Debug` output and zeroes the buffer once the last copy goes
//! away.

use std::fmt;
use std::ops::Deref;
use zeroize::Zeroize;

/// An opaque credential that zeroes its buffer on drop
///
/// # Example
///
/// ```
/// use creative_monitor::security::SecretToken;
///
/// let token = SecretToken::new("tok-0123456789".to_string());
/// assert_eq!(token.expose(), "tok-0123456789");
/// assert!(!format!("{:?}", token).contains("0123456789"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken {
    inner: String,
}

impl SecretToken {
    /// Takes ownership of `value`; its memory is zeroed on drop
    pub fn new(value: String) -> Self {
        Self { inner: value }
    }

    /// Returns the raw credential
    ///
    /// Only pass the result to the request body or the token store.
    pub fn expose(&self) -> &str {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Redacted form suitable for logs
    pub fn redacted(&self) -> String {
        super::redact_token(&self.inner)
    }
}

impl Drop for SecretToken {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl Zeroize for SecretToken {
    fn zeroize(&mut self) {
        self.inner.zeroize();
    }
}

impl Deref for SecretToken {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<String> for SecretToken {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretToken {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

// No Display impl, so a token can't end up in a format string by accident
impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretToken")
            .field("len", &self.inner.len())
            .field("value", &"[REDACTED]")
            .finish()
    }
}
