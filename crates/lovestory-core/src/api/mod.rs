//! HTTP client for the couple backend.
//!
//! `ApiClient` owns the reqwest client, injects the bearer token kept in the
//! shared `SettingsStore`, and turns non-2xx answers into `ApiError`. The
//! endpoint groups live in the submodules as `impl ApiClient` blocks.

pub mod auth;
pub mod couple;
pub mod envelope;
pub mod media;
pub mod notifications;
pub mod settings;
pub mod special_dates;
pub mod users;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::store::{SettingsStore, StoreError};

pub use auth::AuthData;
pub use envelope::{ApiPayload, Envelope, Page};
pub use media::{MediaPage, UploadItem};
pub use notifications::Notification;
pub use settings::CoupleSettings;
pub use special_dates::{NewSpecialDate, SpecialDate, SpecialDateKind};
pub use users::{UpdateProfile, UserProfile};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("not authenticated; please log in again")]
    Unauthorized,
    #[error("API request failed with status {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("{0}")]
    Rejected(String),
    #[error("response carried no data")]
    MissingData,
    #[error("failed to parse response as JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{} is {size} bytes, above the {limit} byte upload limit", .path.display())]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Authenticated client for the REST backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    uploads_url: String,
    max_file_size: u64,
    store: Arc<SettingsStore>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, store: Arc<SettingsStore>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            uploads_url: config.uploads_url.trim_end_matches('/').to_string(),
            max_file_size: config.max_file_size,
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn uploads_url(&self) -> &str {
        &self.uploads_url
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match self.store.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send, check the status, and return the raw body.
    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let request = self.apply_auth(request).build()?;
        debug!(method = %request.method(), url = %request.url(), "api request");

        let response = self.client.execute(request).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("server answered 401, clearing stored token");
            self.store.clear_token()?;
            return Err(ApiError::Unauthorized);
        }

        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                message: error_message(&body),
            });
        }

        Ok(body.to_vec())
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.execute(request).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// GET and decode the JSON body as-is.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(self.client.get(self.build_url(path))).await
    }

    /// GET with query parameters.
    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        self.fetch(request).await
    }

    /// POST a JSON body.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.fetch(self.client.post(self.build_url(path)).json(body)).await
    }

    /// POST without a body; whatever comes back is ignored.
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.execute(self.client.post(self.build_url(path))).await?;
        Ok(())
    }

    /// PUT a JSON body.
    pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.fetch(self.client.put(self.build_url(path)).json(body)).await
    }

    /// POST a multipart form.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        self.fetch(self.client.post(self.build_url(path)).multipart(form)).await
    }

    /// DELETE; the response body is ignored.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(self.client.delete(self.build_url(path))).await?;
        Ok(())
    }

    /// GET and unwrap an envelope-or-bare payload.
    pub async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get::<ApiPayload<T>>(path).await?.into_result()
    }

    pub async fn post_data<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.post_json::<ApiPayload<T>, B>(path, body).await?.into_result()
    }

    pub async fn put_data<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.put_json::<ApiPayload<T>, B>(path, body).await?.into_result()
    }
}

/// Envelope message if the error body has one, otherwise the body text.
fn error_message(body: &[u8]) -> String {
    if let Ok(env) = serde_json::from_slice::<Envelope<serde_json::Value>>(body) {
        if let Some(message) = env.message.filter(|m| !m.is_empty()) {
            return message;
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        "Unknown error".to_string()
    } else {
        text
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Client pointed at a mock server with an in-memory store.
    pub(crate) fn test_client(server_url: &str) -> ApiClient {
        let config = ClientConfig {
            api_base_url: format!("{}/api/", server_url),
            uploads_url: format!("{}/uploads", server_url),
            ..ClientConfig::default()
        };
        ApiClient::new(&config, Arc::new(SettingsStore::in_memory())).unwrap()
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(br#"{"success": false, "message": "Not in a couple"}"#), "Not in a couple");
        assert_eq!(error_message(b"  plain failure "), "plain failure");
        assert_eq!(error_message(b""), "Unknown error");
    }

    #[test]
    fn test_build_url_trims_slash() {
        let client = test_client("http://localhost:1");
        assert_eq!(client.build_url("/media"), "http://localhost:1/api/media");
    }

    #[tokio::test]
    async fn test_bearer_token_injected() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/users/me")
            .match_header("authorization", "Bearer tok-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 1, "username": "an"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        client.store().set_token("tok-123").unwrap();
        let me: serde_json::Value = client.get("/users/me").await.unwrap();
        assert_eq!(me["username"], "an");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_clears_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/media")
            .with_status(401)
            .create_async()
            .await;

        let client = test_client(&server.url());
        client.store().set_token("expired").unwrap();
        let err = client.get::<serde_json::Value>("/media").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(client.store().token().is_none());
    }

    #[tokio::test]
    async fn test_status_error_uses_envelope_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/api/media/9")
            .with_status(403)
            .with_body(r#"{"success": false, "message": "Forbidden - not owner"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        match client.delete("/media/9").await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(message, "Forbidden - not owner");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
