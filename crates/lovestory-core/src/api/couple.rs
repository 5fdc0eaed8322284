use serde::Serialize;
use tracing::{info, warn};

use super::envelope::ApiPayload;
use super::{ApiClient, ApiError};
use crate::couple::{Couple, CoupleRequest, PairingState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    invite_code: &'a str,
}

/// `Ok(None)` for anything but an authentication failure.
fn optional<T>(result: Result<Option<T>, ApiError>, what: &str) -> Result<Option<T>, ApiError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_unauthorized() => Err(e),
        Err(e) => {
            warn!(error = %e, "could not load {}", what);
            Ok(None)
        }
    }
}

impl ApiClient {
    /// The current couple, or `None` when not paired or the lookup fails.
    pub async fn my_couple(&self) -> Result<Option<Couple>, ApiError> {
        let result = self
            .get::<ApiPayload<Couple>>("/couple")
            .await
            .and_then(ApiPayload::into_option);
        optional(result, "couple")
    }

    /// Invite the owner of `invite_code`. Replaces our previous pending request.
    pub async fn send_request(&self, invite_code: &str) -> Result<CoupleRequest, ApiError> {
        let request: CoupleRequest = self
            .post_data(
                "/couple/request",
                &SendRequest {
                    invite_code: invite_code.trim(),
                },
            )
            .await?;
        info!(request = request.id, "couple request sent");
        Ok(request)
    }

    /// Requests other people sent to us.
    pub async fn pending_requests(&self) -> Result<Vec<CoupleRequest>, ApiError> {
        let payload: ApiPayload<Vec<CoupleRequest>> = self.get("/couple/requests/pending").await?;
        Ok(payload.into_option()?.unwrap_or_default())
    }

    /// Our own outstanding request, if any.
    pub async fn sent_request(&self) -> Result<Option<CoupleRequest>, ApiError> {
        let result = self
            .get::<ApiPayload<CoupleRequest>>("/couple/my-sent-request")
            .await
            .and_then(ApiPayload::into_option);
        optional(result, "sent request")
    }

    pub async fn cancel_request(&self, request_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/couple/request/{}", request_id)).await?;
        info!(request = request_id, "couple request cancelled");
        Ok(())
    }

    /// Accept a request and return the couple it created.
    pub async fn accept_request(&self, request_id: i64) -> Result<Couple, ApiError> {
        self.post_empty(&format!("/couple/request/{}/accept", request_id))
            .await?;
        info!(request = request_id, "couple request accepted");
        self.my_couple().await?.ok_or(ApiError::MissingData)
    }

    pub async fn reject_request(&self, request_id: i64) -> Result<(), ApiError> {
        self.post_empty(&format!("/couple/request/{}/reject", request_id))
            .await?;
        info!(request = request_id, "couple request rejected");
        Ok(())
    }

    pub async fn breakup(&self) -> Result<(), ApiError> {
        self.delete("/couple").await?;
        info!("couple dissolved");
        Ok(())
    }

    /// Where this account stands, from the three lookups run concurrently.
    pub async fn pairing_state(&self) -> Result<PairingState, ApiError> {
        let (couple, sent, pending) = tokio::try_join!(
            self.my_couple(),
            self.sent_request(),
            self.pending_requests()
        )?;
        Ok(PairingState::resolve(couple, sent, pending))
    }
}
