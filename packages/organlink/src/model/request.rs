use super::{de, EntityId};
use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

///
/// One hospital's request to use another hospital's donor for a patient.
///
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MatchRequest {
    pub request_id: EntityId,

    #[serde(default, deserialize_with = "de::lenient_opt")]
    pub patient_id: Option<EntityId>,

    #[serde(default, deserialize_with = "de::lenient_opt")]
    pub donor_id: Option<EntityId>,

    pub status: RequestStatus,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub response_notes: Option<String>,

    #[serde(default, deserialize_with = "de::lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "de::lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Set on the received list once the requesting hospital has seen the response
    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub is_viewed: bool,

    #[serde(default)]
    pub patient_name: Option<String>,

    #[serde(default)]
    pub requesting_hospital_name: Option<String>,

    #[serde(default)]
    pub donor_hospital_name: Option<String>,
}

///
/// Request lifecycle
///
///   pending -> accepted | rejected
///   accepted -> completed
///
/// The server owns the lifecycle. Transitions are checked locally only when the current status is known.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[serde(alias = "Pending", alias = "PENDING")]
    Pending,
    #[serde(alias = "Accepted", alias = "ACCEPTED")]
    Accepted,
    #[serde(alias = "Rejected", alias = "REJECTED", alias = "declined")]
    Rejected,
    #[serde(alias = "Completed", alias = "COMPLETED")]
    Completed,
}

///
/// Response of the donor-holding hospital to a pending request
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Decision {
    Accept,
    Decline,
}

impl RequestStatus {
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Accepted)
                | (RequestStatus::Pending, RequestStatus::Rejected)
                | (RequestStatus::Accepted, RequestStatus::Completed)
        )
    }

    pub fn transition(self, next: RequestStatus) -> Result<RequestStatus, Error> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Rejected | RequestStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
        }
    }
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Decision {
    pub fn status(self) -> RequestStatus {
        match self {
            Decision::Accept => RequestStatus::Accepted,
            Decision::Decline => RequestStatus::Rejected,
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Decision::Accept => "accepted",
            Decision::Decline => "declined",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lifecycle_transitions() {
        use RequestStatus::*;

        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Accepted.can_transition_to(Completed));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Accepted.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Accepted));
        assert!(!Completed.can_transition_to(Pending));

        assert!(matches!(
            Rejected.transition(Accepted),
            Err(Error::InvalidTransition {
                from: Rejected,
                to: Accepted
            })
        ));
        assert_eq!(Pending.transition(Accepted).unwrap(), Accepted);
    }

    #[test]
    fn decision_targets() {
        assert_eq!(Decision::Accept.status(), RequestStatus::Accepted);
        assert_eq!(Decision::Decline.status(), RequestStatus::Rejected);
        assert!(Decision::Decline.status().is_terminal());
    }

    #[test]
    fn deserializes_server_rows() {
        let request: MatchRequest = serde_json::from_value(json!({
            "request_id": 14,
            "patient_id": 3,
            "donor_id": "21",
            "status": "Pending",
            "notes": "Urgent, patient in ICU",
            "created_at": "2025-02-11 08:30:00",
            "updated_at": "not a date",
            "is_viewed": 0
        }))
        .unwrap();

        assert_eq!(request.request_id, EntityId::Number(14));
        assert_eq!(request.donor_id, Some(EntityId::Number(21)));
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.created_at.is_some());
        assert!(request.updated_at.is_none());
        assert!(!request.is_viewed);
    }

    #[test]
    fn serializes_status_lowercase() {
        assert_eq!(
            serde_json::to_value(RequestStatus::Rejected).unwrap(),
            json!("rejected")
        );
    }
}
