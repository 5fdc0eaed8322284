use serde::{Deserialize, Serialize};
use tracing::info;

use super::envelope::ApiPayload;
use super::{ApiClient, ApiError};
use crate::store::USER_KEY;

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

/// Payload of the login and register endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthData {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl ApiClient {
    /// Log in and keep the returned token for later requests.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthData, ApiError> {
        let payload: ApiPayload<AuthData> = self
            .post_json("/auth/login", &Credentials { username, password })
            .await?;
        let auth = payload.into_result()?;

        let token = auth
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Rejected("token not found in response".to_string()))?;
        self.store().set_token(token)?;

        info!(username, "logged in");
        Ok(auth)
    }

    /// Create an account. The session is not started; call `login` afterwards.
    pub async fn register(&self, username: &str, password: &str) -> Result<AuthData, ApiError> {
        self.post_data("/auth/register", &Credentials { username, password })
            .await
    }

    /// Forget the token and the cached profile.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.store().clear_token()?;
        self.store().remove(USER_KEY)?;
        info!("logged out");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.store().token().is_some()
    }
}
