//! Errors returned by the API services

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::TokenStoreError;
use crate::http::FetchError;
use crate::security::ValidationError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Input rejected before sending anything
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Transport or session failure
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// 2xx response whose payload reports failure (`success: false`)
    #[error("Server error: {0}")]
    Server(String),

    /// Response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(#[from] reqwest::Error),

    /// Request or response body is not the expected JSON
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token store error: {0}")]
    Storage(#[from] TokenStoreError),
}

/// Error payloads seen from the API: `{"error": ..}`, `{"detail": ..}`
/// or `{"message": ..}`
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    detail: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Builds a `Status` error, pulling the message out of the body if the
    /// API sent one
    pub fn from_response_body(status: StatusCode, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error.or(b.detail).or(b.message))
            .or_else(|| {
                let text = String::from_utf8_lossy(body).trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });

        ApiError::Status {
            status: status.as_u16(),
            message,
        }
    }

    /// HTTP status for `Status` errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the caller should send the user back to the login screen
    pub fn is_session_lost(&self) -> bool {
        matches!(self, ApiError::Fetch(e) if e.is_session_lost())
    }
}
