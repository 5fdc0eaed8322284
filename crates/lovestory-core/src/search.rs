use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::date;
use crate::media::{MediaRecord, MediaType};

/// Gallery type filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaFilter {
    #[default]
    All,
    Photo,
    Video,
}

impl MediaFilter {
    /// Value for the server's `type` query parameter; `All` sends nothing.
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            MediaFilter::All => None,
            MediaFilter::Photo => Some(MediaType::Photo.as_str()),
            MediaFilter::Video => Some(MediaType::Video.as_str()),
        }
    }

    pub fn matches(&self, media_type: MediaType) -> bool {
        match self {
            MediaFilter::All => true,
            MediaFilter::Photo => media_type == MediaType::Photo,
            MediaFilter::Video => media_type == MediaType::Video,
        }
    }
}

/// Free-text gallery search. Blank fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub caption: Option<String>,
    pub tag: Option<String>,
    /// Prefix of the effective date rendered as `YYYY-MM-DDTHH:MM:SS` in UTC,
    /// e.g. `2024`, `2024-06` or `2024-06-15T09`. Fractional seconds and a
    /// zone suffix never match.
    pub date: Option<String>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        active(&self.caption).is_none() && active(&self.tag).is_none() && active(&self.date).is_none()
    }

    /// All three criteria must hold.
    pub fn matches(&self, record: &MediaRecord) -> bool {
        if let Some(q) = active(&self.caption) {
            let caption = record.caption.as_deref().unwrap_or("");
            if !fold(caption).contains(&fold(q)) {
                return false;
            }
        }

        if let Some(q) = active(&self.tag) {
            let q = fold(q);
            if !record.tags.iter().any(|t| fold(t).contains(&q)) {
                return false;
            }
        }

        if let Some(q) = active(&self.date) {
            let Some(dt) = record.effective_date() else {
                return false;
            };
            if !date::iso_string(&dt).starts_with(q) {
                return false;
            }
        }

        true
    }
}

/// The trimmed query text, or `None` when blank.
fn active(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// NFC + lowercase, so composed and decomposed accents compare equal.
fn fold(s: &str) -> String {
    s.nfc().collect::<String>().to_lowercase()
}

/// Records passing every criterion of `query`, in input order.
pub fn filter_by_search<'a>(records: &'a [MediaRecord], query: &SearchQuery) -> Vec<&'a MediaRecord> {
    records.iter().filter(|m| query.matches(m)).collect()
}

/// Client-side counterpart of the server's `type` filter.
pub fn filter_by_type(records: &[MediaRecord], filter: MediaFilter) -> Vec<&MediaRecord> {
    records.iter().filter(|m| filter.matches(m.media_type)).collect()
}
