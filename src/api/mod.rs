//! API services - Typed access to the analytics endpoints
//!
//! Every service holds a shared [`AuthenticatedClient`], so all calls get
//! session refresh for free:
//! - [`SessionService`]: login, registration, password reset, logout
//! - [`CreativeService`]: categories, brands, creatives and their statistics
//! - [`ProfileService`]: the current user's profile and password

mod creatives;
mod error;
pub mod models;
mod profile;
mod session;

pub use creatives::CreativeService;
pub use error::ApiError;
pub use models::*;
pub use profile::ProfileService;
pub use session::{SessionService, LOGIN_PATH, PASSWORD_RESET_PATH, REGISTER_PATH};

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Decodes a JSON body, turning non-2xx statuses into [`ApiError::Status`]
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(ApiError::from_response_body(status, &body));
    }

    Ok(serde_json::from_slice(&body)?)
}

/// Checks the status and discards the body
pub(crate) async fn expect_success(response: Response) -> Result<(), ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.bytes().await?;
    Err(ApiError::from_response_body(status, &body))
}

/// Some endpoints wrap their payload as `{ success, data, error }`,
/// others return it bare
///
/// A body with a `success` key is always read as the wrapped form, so a
/// malformed wrapper is an error rather than a lenient bare decode.
pub(crate) enum Envelope<T> {
    Wrapped {
        success: bool,
        data: Option<T>,
        error: Option<String>,
    },
    Bare(T),
}

#[derive(Deserialize)]
struct Wrapper<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Envelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;

        if value.get("success").is_some() {
            let wrapper: Wrapper<T> = serde_json::from_value(value).map_err(D::Error::custom)?;
            Ok(Envelope::Wrapped {
                success: wrapper.success,
                data: wrapper.data,
                error: wrapper.error,
            })
        } else {
            serde_json::from_value(value)
                .map(Envelope::Bare)
                .map_err(D::Error::custom)
        }
    }
}

impl<T> Envelope<T> {
    pub(crate) fn into_result(self, context: &str) -> Result<T, ApiError> {
        match self {
            Envelope::Bare(value) => Ok(value),
            Envelope::Wrapped {
                success: true,
                data: Some(value),
                ..
            } => Ok(value),
            Envelope::Wrapped {
                success: true,
                data: None,
                ..
            } => Err(ApiError::Server(format!("{}: response has no data", context))),
            Envelope::Wrapped { error, .. } => Err(ApiError::Server(
                error.unwrap_or_else(|| format!("{} failed", context)),
            )),
        }
    }
}
