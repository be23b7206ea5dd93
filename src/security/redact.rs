//! Redaction for logs and validation of user-supplied credentials
//!
//! Everything that writes a token, an email or a URL to the log goes
//! through here first.

use thiserror::Error;

/// Rejected form input, caught before any request is sent
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field left blank
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// Email does not look like `local@domain.tld`
    #[error("invalid email address")]
    InvalidEmail,
}

/// Shows only the last 4 characters of a token
///
/// ```
/// use creative_monitor::security::redact_token;
///
/// assert_eq!(redact_token("eyJhbGciOiJIUzI1NiJ9.payload.sig9"), "***sig9");
/// assert_eq!(redact_token("abcd"), "****");
/// ```
pub fn redact_token(token: &str) -> String {
    let count = token.chars().count();
    if count > 4 {
        let tail: String = token.chars().skip(count - 4).collect();
        format!("***{}", tail)
    } else {
        "****".to_string()
    }
}

/// Keeps the first 2 characters of the local part and the full domain
///
/// ```
/// use creative_monitor::security::redact_email;
///
/// assert_eq!(redact_email("analyst@agency.ru"), "an...@agency.ru");
/// assert_eq!(redact_email("ab@b.com"), "***@b.com");
/// ```
pub fn redact_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if local.chars().count() > 2 => {
            let head: String = local.chars().take(2).collect();
            format!("{}...@{}", head, domain)
        }
        Some((_, domain)) => format!("***@{}", domain),
        None => "***".to_string(),
    }
}

/// Drops the query string and fragment
///
/// Filter values and ids ride in query strings; logs only need the path.
pub fn redact_url(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Checks `local@domain.tld` shape: no whitespace, exactly one `@`,
/// and a dot inside the domain with text on both sides
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::Empty("email"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }

    let (local, domain) = email.split_once('@').ok_or(ValidationError::InvalidEmail)?;
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }

    // Any dot works as long as both sides are non-empty
    let has_dotted_domain = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if !has_dotted_domain {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(())
}

pub fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty(field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_token() {
        assert_eq!(redact_token("refresh-token-0042"), "***0042");
        assert_eq!(redact_token("abcde"), "***bcde");
        assert_eq!(redact_token("abc"), "****");
        assert_eq!(redact_token(""), "****");
    }

    #[test]
    fn test_redact_token_multibyte() {
        assert_eq!(redact_token("токен-обновления"), "***ения");
    }

    #[test]
    fn test_redact_email() {
        assert_eq!(redact_email("john.doe@example.com"), "jo...@example.com");
        assert_eq!(redact_email("a@b.com"), "***@b.com");
        assert_eq!(redact_email("invalid"), "***");
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("http://localhost:8000/api/creative/filter?category_id=3&limit=20"),
            "http://localhost:8000/api/creative/filter"
        );
        assert_eq!(redact_url("http://h/api/profile#top"), "http://h/api/profile");
        assert_eq!(redact_url("http://h/api/refresh"), "http://h/api/refresh");
    }

    #[test]
    fn test_validate_email_accepts_common_addresses() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last@sub.domain.org").is_ok());
        assert!(validate_email("x@y.z").is_ok());
    }

    #[test]
    fn test_validate_email_rejects_malformed() {
        assert_eq!(validate_email(""), Err(ValidationError::Empty("email")));
        assert_eq!(validate_email("   "), Err(ValidationError::Empty("email")));
        assert_eq!(validate_email("plain"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("@example.com"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("user@localhost"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("user@.com"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("user@example."), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("us er@example.com"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("a@b@c.com"), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("password", "hunter2").is_ok());
        assert_eq!(
            require_non_empty("password", " "),
            Err(ValidationError::Empty("password"))
        );
    }
}
