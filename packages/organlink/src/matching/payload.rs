use crate::model::{de, EntityId, MatchCandidate, RequestStatus};
use serde::{Deserialize, Serialize};

///
/// Response of the enhanced-matches endpoint.
///
/// `policy_applied` is set when an organization allocation policy influenced the scores.
///
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct EnhancedMatches {
    #[serde(default, deserialize_with = "de::lenient_vec")]
    pub matches: Vec<MatchCandidate>,

    #[serde(default, deserialize_with = "de::lenient_opt_usize")]
    pub total_matches: Option<usize>,

    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub policy_applied: bool,

    #[serde(default)]
    pub policy_title: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SendMatchRequest {
    pub patient_id: EntityId,
    pub donor_id: EntityId,
    pub donor_hospital_id: Option<EntityId>,
    pub notes: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchResponse {
    pub status: RequestStatus,
    pub response_notes: String,
}
