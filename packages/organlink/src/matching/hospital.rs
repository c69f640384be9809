use super::{EnhancedMatches, MatchResponse, MatchingService, SendMatchRequest};
use crate::api::{Ack, ApiClient};
use crate::error::Error;
use crate::model::{EntityId, IncomingMatch, MatchRequest, Patient};
use serde_json::json;

const PATIENTS: &str = "/api/hospital/patients";
const ENHANCED_MATCHES: &str = "/api/hospital/matching/enhanced-matches";
const SEND_REQUEST: &str = "/api/hospital/matching/send-request";
const OUTGOING_REQUESTS: &str = "/api/hospital/matching/outgoing-requests";
const RECEIVED_REQUESTS: &str = "/api/hospital/matching/received-requests";
const INCOMING_MATCHES: &str = "/api/hospital/matching/incoming-matches";
const MARK_RECEIVED_VIEWED: &str = "/api/hospital/matching/mark-received-viewed";

fn respond_path(request_id: &EntityId) -> String {
    format!("/api/hospital/matching/requests/{request_id}/respond")
}

fn notification_read_path(notification_id: &EntityId) -> String {
    format!("/api/hospital/notifications/{notification_id}/read")
}

///
/// Matching endpoints of the hospital portal.
/// The client must belong to a hospital session.
///
#[derive(Clone, Debug)]
pub struct HospitalMatching {
    client: ApiClient,
}

impl HospitalMatching {
    pub fn new(client: ApiClient) -> Self {
        HospitalMatching { client }
    }
}

#[async_trait::async_trait]
impl MatchingService for HospitalMatching {
    async fn patients(&self) -> Result<Vec<Patient>, Error> {
        self.client.get_list(PATIENTS).await
    }

    async fn enhanced_matches(&self, patient_id: &EntityId) -> Result<EnhancedMatches, Error> {
        self.client
            .post(ENHANCED_MATCHES, json!({ "patient_id": patient_id }))
            .await
    }

    async fn send_request(&self, request: &SendMatchRequest) -> Result<Ack, Error> {
        let body = serde_json::to_value(request)?;
        self.client.post_ack(SEND_REQUEST, body).await
    }

    async fn respond(&self, request_id: &EntityId, response: &MatchResponse) -> Result<Ack, Error> {
        let body = serde_json::to_value(response)?;
        self.client.post_ack(&respond_path(request_id), body).await
    }

    async fn outgoing_requests(&self) -> Result<Vec<MatchRequest>, Error> {
        self.client.get_list(OUTGOING_REQUESTS).await
    }

    async fn received_requests(&self) -> Result<Vec<MatchRequest>, Error> {
        self.client.get_list(RECEIVED_REQUESTS).await
    }

    async fn incoming_matches(&self) -> Result<Vec<IncomingMatch>, Error> {
        self.client.get_list(INCOMING_MATCHES).await
    }

    async fn mark_notification_read(&self, notification_id: &EntityId) -> Result<(), Error> {
        self.client
            .patch_ack(&notification_read_path(notification_id))
            .await?;
        Ok(())
    }

    async fn mark_received_viewed(&self, request_ids: &[EntityId]) -> Result<(), Error> {
        self.client
            .post_ack(MARK_RECEIVED_VIEWED, json!({ "request_ids": request_ids }))
            .await?;
        Ok(())
    }
}
