use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::envelope::ApiPayload;
use super::{ApiClient, ApiError};
use crate::date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpecialDateKind {
    Birthday,
    Anniversary,
    Custom,
}

/// A date the couple wants to remember.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialDate {
    pub id: i64,
    #[serde(default)]
    pub couple_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: SpecialDateKind,
    #[serde(alias = "title")]
    pub name: String,
    pub date: String,
    /// Owner of a birthday
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl SpecialDate {
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        date::parse_calendar_date(&self.date)
    }
}

/// Body of a create or update call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSpecialDate {
    #[serde(rename = "type")]
    pub kind: SpecialDateKind,
    pub name: String,
    /// `YYYY-MM-DD`
    #[serde(with = "ymd")]
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

mod ymd {
    use chrono::NaiveDate;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }
}

impl ApiClient {
    pub async fn special_dates(&self) -> Result<Vec<SpecialDate>, ApiError> {
        let payload: ApiPayload<Vec<SpecialDate>> = self.get("/special-dates").await?;
        Ok(payload.into_option()?.unwrap_or_default())
    }

    pub async fn create_special_date(&self, new: &NewSpecialDate) -> Result<SpecialDate, ApiError> {
        let created: SpecialDate = self.post_data("/special-dates", new).await?;
        info!(id = created.id, name = %created.name, "special date added");
        Ok(created)
    }

    pub async fn update_special_date(&self, id: i64, update: &NewSpecialDate) -> Result<SpecialDate, ApiError> {
        let updated: SpecialDate = self.put_data(&format!("/special-dates/{}", id), update).await?;
        info!(id = updated.id, name = %updated.name, "special date updated");
        Ok(updated)
    }

    pub async fn delete_special_date(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/special-dates/{}", id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::test_client;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_backend_title_alias() {
        let json = r#"{"id": 2, "coupleId": 10, "type": "ANNIVERSARY", "title": "First date", "date": "2023-02-14T00:00:00Z"}"#;
        let d: SpecialDate = serde_json::from_str(json).unwrap();
        assert_eq!(d.name, "First date");
        assert_eq!(d.kind, SpecialDateKind::Anniversary);
        assert_eq!(d.calendar_date(), NaiveDate::from_ymd_opt(2023, 2, 14));
    }

    #[tokio::test]
    async fn test_create_sends_plain_date() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/special-dates")
            .match_body(Matcher::Json(json!({"type": "BIRTHDAY", "name": "An", "date": "1999-05-03", "userId": 1})))
            .with_status(200)
            .with_body(r#"{"id": 5, "type": "BIRTHDAY", "name": "An", "date": "1999-05-03", "userId": 1}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let new = NewSpecialDate {
            kind: SpecialDateKind::Birthday,
            name: "An".to_string(),
            date: NaiveDate::from_ymd_opt(1999, 5, 3).unwrap(),
            user_id: Some(1),
        };
        let created = client.create_special_date(&new).await.unwrap();
        mock.assert_async().await;
        assert_eq!(created.id, 5);
    }

    #[tokio::test]
    async fn test_list_wrapped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/special-dates")
            .with_status(200)
            .with_body(r#"{"success": true, "data": [{"id": 1, "type": "CUSTOM", "name": "Trip", "date": "2024-08-01"}]}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let dates = client.special_dates().await.unwrap();
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].kind, SpecialDateKind::Custom);
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/special-dates/2")
            .match_body(Matcher::Json(json!({"type": "ANNIVERSARY", "name": "First date", "date": "2023-02-14"})))
            .with_status(200)
            .with_body(r#"{"success": true, "data": {"id": 2, "type": "ANNIVERSARY", "title": "First date", "date": "2023-02-14T00:00:00Z"}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let update = NewSpecialDate {
            kind: SpecialDateKind::Anniversary,
            name: "First date".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 2, 14).unwrap(),
            user_id: None,
        };
        let updated = client.update_special_date(2, &update).await.unwrap();
        mock.assert_async().await;
        assert_eq!(updated.name, "First date");
        assert_eq!(updated.calendar_date(), NaiveDate::from_ymd_opt(2023, 2, 14));
    }
}
