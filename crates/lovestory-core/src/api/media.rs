use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use reqwest::multipart::{Form, Part};
use tracing::{info, warn};

use super::envelope::{ApiPayload, Page};
use super::{ApiClient, ApiError};
use crate::date::exif;
use crate::media::{join_url, MediaRecord, MediaType};
use crate::memories::filter_on_this_day;
use crate::search::MediaFilter;

/// One page of media with its totals.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPage {
    pub media: Vec<MediaRecord>,
    pub total_pages: u32,
    pub total_elements: u64,
}

/// A local file to upload, with the annotations from the upload form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadItem {
    pub path: PathBuf,
    pub caption: Option<String>,
    pub tags: Vec<String>,
    /// Left empty, the EXIF capture date of an image is used when present
    pub media_date: Option<NaiveDate>,
}

impl UploadItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl ApiClient {
    /// Public URL of an uploaded file.
    pub fn media_url(&self, file_name: &str) -> String {
        join_url(self.uploads_url(), file_name)
    }

    /// Authenticated download endpoint of a record.
    pub fn download_url(&self, id: i64) -> String {
        self.build_url(&format!("/media/{}/download", id))
    }

    fn resolve_urls(&self, mut media: Vec<MediaRecord>) -> Vec<MediaRecord> {
        for m in media.iter_mut() {
            m.resolve_download_url(self.uploads_url());
        }
        media
    }

    /// All media of the couple, optionally filtered by type server-side.
    pub async fn list_media(&self, filter: MediaFilter) -> Result<Vec<MediaRecord>, ApiError> {
        let query: Vec<(&str, String)> = filter
            .query_value()
            .map(|t| vec![("type", t.to_string())])
            .unwrap_or_default();
        let payload: ApiPayload<Vec<MediaRecord>> = self.get_query("/media", &query).await?;
        let media = payload.into_option()?.unwrap_or_default();
        Ok(self.resolve_urls(media))
    }

    /// One page of media (0-based `page`).
    pub async fn list_media_page(
        &self,
        page: u32,
        size: u32,
        filter: MediaFilter,
    ) -> Result<MediaPage, ApiError> {
        let mut query = vec![("page", page.to_string()), ("size", size.to_string())];
        if let Some(t) = filter.query_value() {
            query.push(("type", t.to_string()));
        }
        let payload: ApiPayload<Page<MediaRecord>> = self.get_query("/media/paginated", &query).await?;
        let page = payload.into_option()?.unwrap_or_default();
        Ok(MediaPage {
            media: self.resolve_urls(page.content),
            total_pages: page.total_pages,
            total_elements: page.total_elements,
        })
    }

    /// Memories for `today` from the server, or computed locally from the full
    /// list when the endpoint is unavailable. Authentication failures are not retried.
    pub async fn on_this_day(&self, today: NaiveDate) -> Result<Vec<MediaRecord>, ApiError> {
        let remote = self
            .get::<ApiPayload<Vec<MediaRecord>>>("/media/on-this-day")
            .await
            .and_then(ApiPayload::into_option);

        match remote {
            Ok(media) => Ok(self.resolve_urls(media.unwrap_or_default())),
            Err(e) if e.is_unauthorized() => Err(e),
            Err(e) => {
                warn!(error = %e, "on-this-day endpoint failed, filtering locally");
                let all = self.list_media(MediaFilter::All).await?;
                Ok(filter_on_this_day(&all, today).into_iter().cloned().collect())
            }
        }
    }

    /// Upload one file with its caption, tags and date.
    pub async fn upload_media(&self, item: &UploadItem) -> Result<MediaRecord, ApiError> {
        let size = tokio::fs::metadata(&item.path).await?.len();
        if size > self.max_file_size {
            return Err(ApiError::FileTooLarge {
                path: item.path.clone(),
                size,
                limit: self.max_file_size,
            });
        }

        let bytes = tokio::fs::read(&item.path).await?;
        let content_type = mime_guess::from_path(&item.path).first_or_octet_stream();
        let media_type = MediaType::from_content_type(content_type.essence_str());

        let media_date = item.media_date.or_else(|| match media_type {
            MediaType::Photo => exif::extract_capture_date(&bytes),
            MediaType::Video => None,
        });

        let form = Form::new()
            .part(
                "file",
                Part::bytes(bytes)
                    .file_name(file_name(&item.path))
                    .mime_str(content_type.essence_str())?,
            )
            .text("caption", item.caption.clone().unwrap_or_default())
            .text("tags", item.tags.join(","))
            .text(
                "mediaDate",
                media_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            );

        let payload: ApiPayload<MediaRecord> = self.post_multipart("/media/upload", form).await?;
        let mut record = payload.into_result()?;
        record.resolve_download_url(self.uploads_url());
        info!(id = record.id, path = %item.path.display(), "uploaded media");
        Ok(record)
    }

    pub async fn delete_media(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/media/{}", id)).await
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string()
}
