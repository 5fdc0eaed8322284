use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError};

/// Shared look-and-feel settings of the couple.
///
/// Every field is optional on the way out so a partial update only touches
/// what was set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupleSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub couple_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, alias = "fontFamily", skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// `COLOR` or `IMAGE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_type: Option<String>,
    #[serde(default, alias = "backgroundColor", skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications_enabled: Option<bool>,
}

impl ApiClient {
    pub async fn couple_settings(&self) -> Result<CoupleSettings, ApiError> {
        self.get_data("/settings").await
    }

    pub async fn update_couple_settings(&self, settings: &CoupleSettings) -> Result<CoupleSettings, ApiError> {
        self.put_data("/settings", settings).await
    }
}
