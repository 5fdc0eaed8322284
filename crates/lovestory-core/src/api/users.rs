use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::envelope::ApiPayload;
use super::{ApiClient, ApiError};
use crate::store::USER_KEY;

/// The signed-in account as returned by `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub invite_code: Option<String>,
    #[serde(default)]
    pub couple_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl UserProfile {
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// Profile fields to change; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
}

impl UpdateProfile {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.email.is_none() && self.birthday.is_none()
    }
}

impl ApiClient {
    /// Fetch the current profile and cache it in the store.
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        let profile: UserProfile = self.get_data("/users/me").await?;
        self.store().set(USER_KEY, &profile)?;
        Ok(profile)
    }

    /// Profile cached by the last `me` call, if any.
    pub fn cached_profile(&self) -> Option<UserProfile> {
        self.store().get_as(USER_KEY).ok().flatten()
    }

    pub async fn update_profile(&self, update: &UpdateProfile) -> Result<UserProfile, ApiError> {
        let profile: UserProfile = self.put_data("/users/profile", update).await?;
        self.store().set(USER_KEY, &profile)?;
        Ok(profile)
    }

    pub async fn upload_avatar(&self, path: &Path) -> Result<UserProfile, ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let content_type = mime_guess::from_path(path).first_or_octet_stream();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("avatar")
            .to_string();
        let form = Form::new().part(
            "file",
            Part::bytes(bytes)
                .file_name(file_name)
                .mime_str(content_type.essence_str())?,
        );

        let payload: ApiPayload<UserProfile> = self.post_multipart("/users/avatar", form).await?;
        let profile = payload.into_result()?;
        self.store().set(USER_KEY, &profile)?;
        info!(path = %path.display(), "avatar updated");
        Ok(profile)
    }

    /// Invite code the partner needs to send a request to us.
    pub async fn invite_code(&self) -> Result<Option<String>, ApiError> {
        Ok(self.me().await?.invite_code.filter(|c| !c.is_empty()))
    }
}
