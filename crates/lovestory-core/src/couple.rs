use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date;
use crate::memories::compute_days_together;

/// A linked pair of accounts as returned by `GET /couple`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Couple {
    pub id: i64,
    #[serde(default)]
    pub user1_id: Option<i64>,
    #[serde(default)]
    pub user1_display_name: Option<String>,
    #[serde(default)]
    pub user1_avatar: Option<String>,
    #[serde(default)]
    pub user2_id: Option<i64>,
    #[serde(default)]
    pub user2_display_name: Option<String>,
    #[serde(default)]
    pub user2_avatar: Option<String>,
    #[serde(default)]
    pub anniversary_date: Option<String>,
    #[serde(default)]
    pub days_together: Option<i64>,
    /// `ACTIVE` or `INACTIVE`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Couple {
    pub fn is_active(&self) -> bool {
        !self
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("INACTIVE"))
    }

    /// Day the relationship is counted from: anniversary, else pairing date.
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.anniversary_date
            .as_deref()
            .and_then(date::parse_calendar_date)
            .or_else(|| self.created_at.as_deref().and_then(date::parse_calendar_date))
    }

    /// The server's count when it sent one, otherwise computed locally.
    pub fn days_together(&self, today: NaiveDate) -> i64 {
        self.days_together
            .unwrap_or_else(|| compute_days_together(self.start_date(), today))
    }

    pub fn names(&self) -> (String, String) {
        let name = |n: &Option<String>, id: Option<i64>| {
            n.clone()
                .unwrap_or_else(|| id.map_or_else(|| "?".to_string(), |id| format!("user #{id}")))
        };
        (
            name(&self.user1_display_name, self.user1_id),
            name(&self.user2_display_name, self.user2_id),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// An invitation from one account to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupleRequest {
    pub id: i64,
    #[serde(default)]
    pub from_user_id: Option<i64>,
    #[serde(default)]
    pub from_user_display_name: Option<String>,
    #[serde(default)]
    pub from_user_avatar: Option<String>,
    #[serde(default)]
    pub to_user_id: Option<i64>,
    #[serde(default)]
    pub to_user_display_name: Option<String>,
    #[serde(default)]
    pub to_user_avatar: Option<String>,
    pub status: RequestStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl CoupleRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Where the current account stands in the pairing workflow.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PairingState {
    #[default]
    Unconnected,
    RequestSent(CoupleRequest),
    /// Incoming requests, plus our own pending one when we also sent one
    RequestReceived {
        incoming: Vec<CoupleRequest>,
        sent: Option<CoupleRequest>,
    },
    Connected(Couple),
    Disconnected,
}

/// Something the user wants to do, checked before the call goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingAction {
    SendRequest,
    CancelRequest,
    Accept(i64),
    Reject(i64),
    Breakup,
}

/// A confirmed backend outcome that moves the state.
#[derive(Debug, Clone, PartialEq)]
pub enum PairingEvent {
    RequestSent(CoupleRequest),
    RequestCancelled,
    RequestAccepted { request_id: i64, couple: Couple },
    RequestRejected { request_id: i64 },
    BrokeUp,
}

impl PairingEvent {
    pub fn action(&self) -> PairingAction {
        match self {
            PairingEvent::RequestSent(_) => PairingAction::SendRequest,
            PairingEvent::RequestCancelled => PairingAction::CancelRequest,
            PairingEvent::RequestAccepted { request_id, .. } => PairingAction::Accept(*request_id),
            PairingEvent::RequestRejected { request_id } => PairingAction::Reject(*request_id),
            PairingEvent::BrokeUp => PairingAction::Breakup,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PairingError {
    #[error("cannot {action:?} while {state}")]
    InvalidTransition { state: &'static str, action: PairingAction },
    #[error("no pending request with id {0}")]
    UnknownRequest(i64),
}

impl PairingState {
    /// Derive the state from the three backend lookups.
    ///
    /// An active couple wins, then incoming requests (keeping our own pending
    /// request alongside), then our own pending request.
    pub fn resolve(
        couple: Option<Couple>,
        sent: Option<CoupleRequest>,
        pending: Vec<CoupleRequest>,
    ) -> Self {
        if let Some(couple) = couple.filter(Couple::is_active) {
            return PairingState::Connected(couple);
        }
        let sent = sent.filter(CoupleRequest::is_pending);
        let incoming: Vec<CoupleRequest> = pending.into_iter().filter(CoupleRequest::is_pending).collect();
        if !incoming.is_empty() {
            return PairingState::RequestReceived { incoming, sent };
        }
        match sent {
            Some(request) => PairingState::RequestSent(request),
            None => PairingState::Unconnected,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PairingState::Unconnected => "unconnected",
            PairingState::RequestSent(_) => "request-sent",
            PairingState::RequestReceived { .. } => "request-received",
            PairingState::Connected(_) => "connected",
            PairingState::Disconnected => "disconnected",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, PairingState::Connected(_))
    }

    /// Our own pending request, whichever state carries it.
    pub fn sent_request(&self) -> Option<&CoupleRequest> {
        match self {
            PairingState::RequestSent(request) => Some(request),
            PairingState::RequestReceived { sent, .. } => sent.as_ref(),
            _ => None,
        }
    }

    pub fn ensure_allowed(&self, action: &PairingAction) -> Result<(), PairingError> {
        let allowed = match (self, action) {
            // Sending again replaces our previous pending request server-side
            (PairingState::Connected(_), PairingAction::SendRequest) => false,
            (_, PairingAction::SendRequest) => true,
            (_, PairingAction::CancelRequest) => self.sent_request().is_some(),
            (
                PairingState::RequestReceived { incoming, .. },
                PairingAction::Accept(id) | PairingAction::Reject(id),
            ) => {
                if !incoming.iter().any(|r| r.id == *id) {
                    return Err(PairingError::UnknownRequest(*id));
                }
                true
            }
            (PairingState::Connected(_), PairingAction::Breakup) => true,
            _ => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(PairingError::InvalidTransition {
                state: self.name(),
                action: *action,
            })
        }
    }

    pub fn apply(self, event: PairingEvent) -> Result<PairingState, PairingError> {
        self.ensure_allowed(&event.action())?;
        Ok(match (self, event) {
            (PairingState::RequestReceived { incoming, .. }, PairingEvent::RequestSent(request)) => {
                PairingState::RequestReceived {
                    incoming,
                    sent: Some(request),
                }
            }
            (_, PairingEvent::RequestSent(request)) => PairingState::RequestSent(request),
            (PairingState::RequestReceived { incoming, .. }, PairingEvent::RequestCancelled) => {
                PairingState::RequestReceived { incoming, sent: None }
            }
            (_, PairingEvent::RequestCancelled) => PairingState::Unconnected,
            (_, PairingEvent::RequestAccepted { couple, .. }) => PairingState::Connected(couple),
            (PairingState::RequestReceived { incoming, sent }, PairingEvent::RequestRejected { request_id }) => {
                let rest: Vec<CoupleRequest> = incoming.into_iter().filter(|r| r.id != request_id).collect();
                match (rest.is_empty(), sent) {
                    (true, Some(request)) => PairingState::RequestSent(request),
                    (true, None) => PairingState::Unconnected,
                    (false, sent) => PairingState::RequestReceived { incoming: rest, sent },
                }
            }
            (_, PairingEvent::RequestRejected { .. }) => PairingState::Unconnected,
            (_, PairingEvent::BrokeUp) => PairingState::Disconnected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: i64, status: RequestStatus) -> CoupleRequest {
        CoupleRequest {
            id,
            from_user_id: Some(1),
            from_user_display_name: Some("An".to_string()),
            from_user_avatar: None,
            to_user_id: Some(2),
            to_user_display_name: Some("Binh".to_string()),
            to_user_avatar: None,
            status,
            created_at: None,
        }
    }

    fn couple(status: &str) -> Couple {
        Couple {
            id: 10,
            user1_id: Some(1),
            user1_display_name: Some("An".to_string()),
            user1_avatar: None,
            user2_id: Some(2),
            user2_display_name: None,
            user2_avatar: None,
            anniversary_date: Some("2024-01-01T00:00:00Z".to_string()),
            days_together: None,
            status: Some(status.to_string()),
            created_at: Some("2024-02-01T00:00:00Z".to_string()),
        }
    }

    fn received(incoming: Vec<CoupleRequest>, sent: Option<CoupleRequest>) -> PairingState {
        PairingState::RequestReceived { incoming, sent }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_resolve_precedence() {
        let state = PairingState::resolve(
            Some(couple("ACTIVE")),
            Some(request(1, RequestStatus::Pending)),
            vec![request(2, RequestStatus::Pending)],
        );
        assert!(state.is_connected());

        let state = PairingState::resolve(
            Some(couple("INACTIVE")),
            Some(request(1, RequestStatus::Pending)),
            vec![request(2, RequestStatus::Pending), request(3, RequestStatus::Rejected)],
        );
        match state {
            PairingState::RequestReceived { incoming, sent } => {
                assert_eq!(incoming.len(), 1);
                assert_eq!(sent.map(|r| r.id), Some(1));
            }
            other => panic!("unexpected {other:?}"),
        }

        let state = PairingState::resolve(None, Some(request(1, RequestStatus::Pending)), vec![]);
        assert_eq!(state.name(), "request-sent");

        let state = PairingState::resolve(None, Some(request(1, RequestStatus::Cancelled)), vec![]);
        assert_eq!(state, PairingState::Unconnected);
    }

    #[test]
    fn test_full_cycle() {
        let state = PairingState::Unconnected;
        let state = state.apply(PairingEvent::RequestSent(request(1, RequestStatus::Pending))).unwrap();
        let state = state.apply(PairingEvent::RequestCancelled).unwrap();
        assert_eq!(state, PairingState::Unconnected);

        let state = received(vec![request(5, RequestStatus::Pending)], None);
        let state = state
            .apply(PairingEvent::RequestAccepted {
                request_id: 5,
                couple: couple("ACTIVE"),
            })
            .unwrap();
        assert!(state.is_connected());

        let state = state.apply(PairingEvent::BrokeUp).unwrap();
        assert_eq!(state, PairingState::Disconnected);

        let state = state.apply(PairingEvent::RequestSent(request(6, RequestStatus::Pending))).unwrap();
        assert_eq!(state.name(), "request-sent");
    }

    #[test]
    fn test_reject_keeps_other_requests() {
        let state = received(
            vec![request(5, RequestStatus::Pending), request(6, RequestStatus::Pending)],
            None,
        );
        let state = state.apply(PairingEvent::RequestRejected { request_id: 5 }).unwrap();
        match &state {
            PairingState::RequestReceived { incoming, .. } => assert_eq!(incoming[0].id, 6),
            other => panic!("unexpected {other:?}"),
        }
        let state = state.apply(PairingEvent::RequestRejected { request_id: 6 }).unwrap();
        assert_eq!(state, PairingState::Unconnected);
    }

    #[test]
    fn test_invalid_transitions() {
        let err = PairingState::Unconnected.ensure_allowed(&PairingAction::Breakup).unwrap_err();
        assert!(matches!(err, PairingError::InvalidTransition { state: "unconnected", .. }));

        let connected = PairingState::Connected(couple("ACTIVE"));
        assert!(connected.ensure_allowed(&PairingAction::SendRequest).is_err());

        let state = received(vec![request(5, RequestStatus::Pending)], None);
        assert_eq!(
            state.ensure_allowed(&PairingAction::Accept(99)),
            Err(PairingError::UnknownRequest(99))
        );
        assert!(state.ensure_allowed(&PairingAction::CancelRequest).is_err());
        assert!(PairingState::Unconnected.ensure_allowed(&PairingAction::CancelRequest).is_err());
    }

    #[test]
    fn test_sent_and_received_at_once() {
        let state = PairingState::resolve(
            None,
            Some(request(10, RequestStatus::Pending)),
            vec![request(11, RequestStatus::Pending)],
        );
        assert_eq!(state.name(), "request-received");
        assert_eq!(state.sent_request().map(|r| r.id), Some(10));

        assert!(state.ensure_allowed(&PairingAction::CancelRequest).is_ok());
        assert!(state.ensure_allowed(&PairingAction::SendRequest).is_ok());
        assert!(state.ensure_allowed(&PairingAction::Accept(11)).is_ok());

        let state = state
            .apply(PairingEvent::RequestSent(request(12, RequestStatus::Pending)))
            .unwrap();
        assert_eq!(state.sent_request().map(|r| r.id), Some(12));

        // Rejecting the last incoming request leaves our own pending one
        let after_reject = state
            .clone()
            .apply(PairingEvent::RequestRejected { request_id: 11 })
            .unwrap();
        assert_eq!(after_reject.name(), "request-sent");
        assert_eq!(after_reject.sent_request().map(|r| r.id), Some(12));

        let state = state.apply(PairingEvent::RequestCancelled).unwrap();
        assert_eq!(state, received(vec![request(11, RequestStatus::Pending)], None));
        assert!(state.ensure_allowed(&PairingAction::CancelRequest).is_err());
    }

    #[test]
    fn test_days_together() {
        let mut c = couple("ACTIVE");
        assert_eq!(c.days_together(day(2024, 1, 11)), 10);

        c.anniversary_date = None;
        assert_eq!(c.days_together(day(2024, 2, 11)), 10);

        c.days_together = Some(400);
        assert_eq!(c.days_together(day(2024, 2, 11)), 400);

        c.created_at = None;
        c.days_together = None;
        assert_eq!(c.days_together(day(2024, 2, 11)), 0);
    }

    #[test]
    fn test_deserialize_request() {
        let json = r#"{"id": 3, "fromUserId": 1, "toUserId": 2, "status": "PENDING", "createdAt": "2024-01-01T00:00:00Z"}"#;
        let r: CoupleRequest = serde_json::from_str(json).unwrap();
        assert!(r.is_pending());

        let json = r#"{"id": 3, "status": "EXPIRED"}"#;
        let r: CoupleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(r.status, RequestStatus::Unknown);
    }
}
