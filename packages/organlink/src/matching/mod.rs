//! Organ matching for the hospital portal.
//!
//! A hospital searches donor matches for a waiting patient, sends a match request to the
//! hospital holding the donor, and answers requests other hospitals send it. The four lists
//! involved (patients, incoming, outgoing, received) are server projections and are
//! re-fetched after every change.

mod hospital;
mod payload;
mod ranking;
mod view;
mod workspace;

pub use hospital::HospitalMatching;
pub use payload::{EnhancedMatches, MatchResponse, SendMatchRequest};
pub use ranking::{RankedMatches, SearchResults, TOP_MATCHES};
pub use view::{Tab, ViewState};
pub use workspace::{MatchingWorkspace, WorkspaceState};

use crate::api::Ack;
use crate::error::Error;
use crate::model::{EntityId, IncomingMatch, MatchRequest, Patient};

/// Matching endpoints of the OrganLink API
#[async_trait::async_trait]
pub trait MatchingService: Send + Sync {
    async fn patients(&self) -> Result<Vec<Patient>, Error>;

    /// Donor candidates scored by the server for a patient
    async fn enhanced_matches(&self, patient_id: &EntityId) -> Result<EnhancedMatches, Error>;

    async fn send_request(&self, request: &SendMatchRequest) -> Result<Ack, Error>;

    async fn respond(&self, request_id: &EntityId, response: &MatchResponse) -> Result<Ack, Error>;

    /// Requests this hospital has sent
    async fn outgoing_requests(&self) -> Result<Vec<MatchRequest>, Error>;

    /// Requests other hospitals have sent for this hospital's donors
    async fn received_requests(&self) -> Result<Vec<MatchRequest>, Error>;

    /// Match request notifications awaiting an answer
    async fn incoming_matches(&self) -> Result<Vec<IncomingMatch>, Error>;

    async fn mark_notification_read(&self, notification_id: &EntityId) -> Result<(), Error>;

    async fn mark_received_viewed(&self, request_ids: &[EntityId]) -> Result<(), Error>;
}
