//! Session lifecycle: login, registration, password reset and logout

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{expect_success, read_json, ApiError};
use crate::http::{AuthenticatedClient, FetchRequest};
use crate::security::{redact_email, require_non_empty, validate_email};

pub const LOGIN_PATH: &str = "/api/login";
pub const REGISTER_PATH: &str = "/api/register";
pub const PASSWORD_RESET_PATH: &str = "/api/password-reset-request";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    refresh_token: String,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    full_name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PasswordResetRequest<'a> {
    email: &'a str,
}

/// Starts and ends sessions
///
/// Login, registration and reset requests are sent without session
/// recovery: a 401 there means wrong credentials, not an expired session.
/// The cookie jar is still shared with the rest of the client, so the
/// access cookie set by login is used by every later request.
pub struct SessionService {
    client: Arc<AuthenticatedClient>,
}

impl SessionService {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    /// Logs in and stores the refresh token
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        validate_email(email)?;
        require_non_empty("password", password)?;

        let request = FetchRequest::post(self.client.endpoint(LOGIN_PATH))
            .json(&LoginRequest { email, password })?;
        let response = self.client.request_once(&request).await?;
        let body: LoginResponse = read_json(response).await?;

        self.client.store().set(&body.refresh_token)?;
        tracing::info!("Logged in as {}", redact_email(email));
        Ok(())
    }

    /// Submits a registration request
    ///
    /// Accounts are activated by an administrator, so no session is created.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        require_non_empty("full name", full_name)?;
        validate_email(email)?;
        require_non_empty("password", password)?;

        let request = FetchRequest::post(self.client.endpoint(REGISTER_PATH)).json(
            &RegisterRequest {
                full_name,
                email,
                password,
            },
        )?;
        let response = self.client.request_once(&request).await?;
        expect_success(response).await?;

        tracing::info!("Registration submitted for {}", redact_email(email));
        Ok(())
    }

    /// Asks the API to email password reset instructions
    ///
    /// The API answers the same way whether or not the address is known.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        validate_email(email)?;

        let request = FetchRequest::post(self.client.endpoint(PASSWORD_RESET_PATH))
            .json(&PasswordResetRequest { email })?;
        let response = self.client.request_once(&request).await?;
        expect_success(response).await
    }

    /// Forgets the stored refresh token
    ///
    /// Returns `true` if there was a session to end.
    pub fn logout(&self) -> Result<bool, ApiError> {
        let had_session = self.client.store().clear()?;
        if had_session {
            tracing::info!("Logged out");
        }
        Ok(had_session)
    }

    /// Whether a refresh token is stored
    pub fn has_session(&self) -> Result<bool, ApiError> {
        Ok(self.client.store().contains()?)
    }
}
