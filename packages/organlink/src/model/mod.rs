//! Server DTOs.
//!
//! Every entity is owned by the OrganLink API. The client keeps short-lived copies and
//! deserializes them leniently: a malformed field degrades to an empty value instead of
//! failing the whole payload.

pub mod de;
mod candidate;
mod donor;
mod id;
mod incoming;
mod notification;
mod patient;
mod request;

pub use candidate::MatchCandidate;
pub use donor::Donor;
pub use id::EntityId;
pub use incoming::IncomingMatch;
pub use notification::{embedded_matches, resolve_request_id, Notification, NotificationKind};
pub use patient::{awaiting_match, Patient, PatientStatus, UrgencyLevel};
pub use request::{Decision, MatchRequest, RequestStatus};
