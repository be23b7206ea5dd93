//! Security module - Secret handling, log redaction and input validation

mod redact;
mod secret;

pub use redact::{
    redact_email, redact_token, redact_url, require_non_empty, validate_email, ValidationError,
};
pub use secret::SecretToken;
