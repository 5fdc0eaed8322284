use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::date;

/// Kind of uploaded asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    #[default]
    Photo,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Photo => "PHOTO",
            MediaType::Video => "VIDEO",
        }
    }

    /// Classify an upload by its MIME type: `video/*` is a video, everything else a photo.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.trim().to_ascii_lowercase().starts_with("video/") {
            MediaType::Video
        } else {
            MediaType::Photo
        }
    }
}

// The server has sent both "VIDEO" and "video"; anything unknown is shown as a photo.
impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if raw.trim().to_ascii_uppercase().starts_with("VIDEO") {
            Ok(MediaType::Video)
        } else {
            Ok(MediaType::Photo)
        }
    }
}

/// One uploaded photo or video as returned by the media endpoints.
///
/// Dates stay raw text: a malformed date only removes the record from
/// date-based views and never fails deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub media_type: MediaType,
    /// User-supplied date of the moment
    #[serde(default, deserialize_with = "date_text")]
    pub media_date: Option<String>,
    /// Server ingestion timestamp
    #[serde(default, deserialize_with = "date_text")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default, deserialize_with = "tag_list")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, alias = "url")]
    pub download_url: Option<String>,
}

impl MediaRecord {
    pub fn new(id: i64, media_type: MediaType) -> Self {
        Self {
            id,
            media_type,
            media_date: None,
            created_at: None,
            caption: None,
            tags: Vec::new(),
            file_name: None,
            original_name: None,
            content_type: None,
            size: None,
            download_url: None,
        }
    }

    /// `media_date` when it parses, otherwise `created_at` when it parses.
    pub fn effective_date(&self) -> Option<DateTime<Utc>> {
        self.media_date
            .as_deref()
            .and_then(date::parse_display_date)
            .or_else(|| self.created_at.as_deref().and_then(date::parse_display_date))
    }

    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    /// Fill `download_url` from `file_name` under the uploads base when the server left it out.
    pub fn resolve_download_url(&mut self, uploads_url: &str) {
        let missing = self.download_url.as_deref().map_or(true, |u| u.trim().is_empty());
        if !missing {
            return;
        }
        self.download_url = self
            .file_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(|name| join_url(uploads_url, name));
    }

    /// Name to show for the record: caption, else original file name, else `#id`.
    pub fn label(&self) -> String {
        self.caption
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.original_name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}

pub(crate) fn join_url(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name.trim_start_matches('/'))
}

/// Accept a string, an epoch number or null for a date field.
fn date_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Tags arrive either as a JSON array or as one comma-separated string.
fn tag_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let tags = match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(tags
        .into_iter()
        .map(|t: String| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_deserialize_backend_record() {
        let json = r#"{
            "id": 7,
            "fileName": "abc.jpg",
            "originalName": "beach.jpg",
            "contentType": "image/jpeg",
            "size": 2048,
            "type": "PHOTO",
            "createdAt": "2024-06-15T10:00:00Z",
            "caption": "Beach day",
            "tags": "sea, sun,,",
            "mediaDate": null
        }"#;
        let m: MediaRecord = serde_json::from_str(json).unwrap();
        assert_eq!(m.id, 7);
        assert_eq!(m.media_type, MediaType::Photo);
        assert_eq!(m.tags, vec!["sea", "sun"]);
        assert!(m.media_date.is_none());
        assert_eq!(m.size, Some(2048));
    }

    #[test]
    fn test_tags_as_array_and_legacy_url() {
        let json = r#"{"id": 1, "type": "video", "tags": ["Trip", " ", "Hanoi"], "url": "http://x/1.mp4"}"#;
        let m: MediaRecord = serde_json::from_str(json).unwrap();
        assert!(m.is_video());
        assert_eq!(m.tags, vec!["Trip", "Hanoi"]);
        assert_eq!(m.download_url.as_deref(), Some("http://x/1.mp4"));
    }

    #[test]
    fn test_unknown_type_and_numeric_date() {
        let json = r#"{"id": 2, "type": "SOMETHING", "createdAt": 1718445600000}"#;
        let m: MediaRecord = serde_json::from_str(json).unwrap();
        assert_eq!(m.media_type, MediaType::Photo);
        assert_eq!(
            m.effective_date().unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
        );
    }

    #[test]
    fn test_effective_date_falls_back() {
        let mut m = MediaRecord::new(1, MediaType::Photo);
        assert!(m.effective_date().is_none());

        m.created_at = Some("2024-01-02T00:00:00Z".to_string());
        m.media_date = Some("garbage".to_string());
        assert_eq!(
            m.effective_date().unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );

        m.media_date = Some("2020-05-05".to_string());
        assert_eq!(
            m.effective_date().unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2020, 5, 5).unwrap()
        );
    }

    #[test]
    fn test_resolve_download_url() {
        let mut m = MediaRecord::new(1, MediaType::Photo);
        m.file_name = Some("a b.jpg".to_string());
        m.resolve_download_url("http://localhost:8080/uploads/");
        assert_eq!(m.download_url.as_deref(), Some("http://localhost:8080/uploads/a b.jpg"));

        // Server-provided URL wins
        let mut m = MediaRecord::new(2, MediaType::Photo);
        m.file_name = Some("x.jpg".to_string());
        m.download_url = Some("https://cdn/x.jpg".to_string());
        m.resolve_download_url("http://localhost:8080/uploads");
        assert_eq!(m.download_url.as_deref(), Some("https://cdn/x.jpg"));

        let mut m = MediaRecord::new(3, MediaType::Photo);
        m.resolve_download_url("http://localhost:8080/uploads");
        assert!(m.download_url.is_none());
    }

    #[test]
    fn test_content_type_classification() {
        assert_eq!(MediaType::from_content_type("video/mp4"), MediaType::Video);
        assert_eq!(MediaType::from_content_type("image/png"), MediaType::Photo);
        assert_eq!(MediaType::from_content_type("application/octet-stream"), MediaType::Photo);
    }
}
