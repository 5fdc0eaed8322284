use serde::{Deserialize, Serialize};

use super::envelope::ApiPayload;
use super::{ApiClient, ApiError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub content: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ApiClient {
    pub async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let payload: ApiPayload<Vec<Notification>> = self.get("/notifications").await?;
        Ok(payload.into_option()?.unwrap_or_default())
    }

    pub async fn mark_notification_read(&self, id: i64) -> Result<(), ApiError> {
        self.post_empty(&format!("/notifications/{}/read", id)).await
    }
}
