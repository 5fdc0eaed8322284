//! Response shapes of the backend.
//!
//! Endpoints answer either with the bare payload or with a
//! `{success, message, data, timestamp}` wrapper; `ApiPayload` accepts both
//! and is resolved once, right after decoding.

use serde::{Deserialize, Serialize};

use super::ApiError;

/// The backend's response wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Either shape of a response body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ApiPayload<T> {
    Wrapped(Envelope<T>),
    Bare(T),
}

impl<T> ApiPayload<T> {
    /// The payload, or `None` when a successful wrapper carried `data: null`.
    pub fn into_option(self) -> Result<Option<T>, ApiError> {
        match self {
            ApiPayload::Bare(data) => Ok(Some(data)),
            ApiPayload::Wrapped(env) if !env.success => Err(ApiError::Rejected(
                env.message.unwrap_or_else(|| "request was not successful".to_string()),
            )),
            ApiPayload::Wrapped(env) => Ok(env.data),
        }
    }

    /// The payload; a missing one is an error.
    pub fn into_result(self) -> Result<T, ApiError> {
        self.into_option()?.ok_or(ApiError::MissingData)
    }
}

/// Spring-style page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            total_pages: 0,
            total_elements: 0,
            number: 0,
            size: 0,
        }
    }
}
