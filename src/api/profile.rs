//! Current user's profile

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::models::{ProfileUpdate, UserProfile};
use super::{read_json, ApiError, Envelope};
use crate::http::{AuthenticatedClient, FetchRequest};
use crate::security::require_non_empty;

const PROFILE: &str = "/api/profile";
const PROFILE_UPDATE: &str = "/api/profile/update";
const CHANGE_PASSWORD: &str = "/api/change-password";

#[derive(Serialize)]
struct ChangePasswordRequest<'a> {
    old_password: &'a str,
    new_password: &'a str,
}

#[derive(Deserialize)]
struct Acknowledgement {
    success: bool,
    error: Option<String>,
}

pub struct ProfileService {
    client: Arc<AuthenticatedClient>,
}

impl ProfileService {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        let request = FetchRequest::get(self.client.endpoint(PROFILE));
        let response = self.client.request(request).await?;
        let envelope: Envelope<UserProfile> = read_json(response).await?;
        envelope.into_result("Profile load")
    }

    /// Applies `update` and returns the profile as stored by the API
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        let request = FetchRequest::patch(self.client.endpoint(PROFILE_UPDATE)).json(update)?;
        let response = self.client.request(request).await?;
        let envelope: Envelope<UserProfile> = read_json(response).await?;
        envelope.into_result("Profile update")
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        require_non_empty("old password", old_password)?;
        require_non_empty("new password", new_password)?;

        let request = FetchRequest::post(self.client.endpoint(CHANGE_PASSWORD)).json(
            &ChangePasswordRequest {
                old_password,
                new_password,
            },
        )?;
        let response = self.client.request(request).await?;
        let ack: Acknowledgement = read_json(response).await?;

        if ack.success {
            tracing::info!("Password changed");
            Ok(())
        } else {
            Err(ApiError::Server(
                ack.error.unwrap_or_else(|| "Password change failed".to_string()),
            ))
        }
    }
}
