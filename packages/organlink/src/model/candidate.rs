use super::{de, Donor, EntityId};
use serde::{Deserialize, Serialize};

///
/// A donor returned by the matching endpoint for one patient.
///
/// Scores are percentages computed by the server and are only displayed.
///
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MatchCandidate {
    pub donor_id: EntityId,

    #[serde(default, deserialize_with = "de::lenient_opt")]
    pub hospital_id: Option<EntityId>,

    #[serde(default)]
    pub donor_name: Option<String>,

    #[serde(default)]
    pub hospital_name: Option<String>,

    #[serde(default)]
    pub blood_type: Option<String>,

    #[serde(default)]
    pub organ_type: Option<String>,

    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub match_score: f64,

    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub compatibility_score: f64,

    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub distance_score: f64,

    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub urgency_bonus: f64,

    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub medical_risk_score: f64,

    #[serde(default, deserialize_with = "de::lenient_opt")]
    pub donor: Option<Donor>,
}

impl MatchCandidate {
    pub fn display_name(&self) -> String {
        self.donor_name
            .clone()
            .or_else(|| self.donor.as_ref().map(|d| d.full_name.clone()))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Donor {}", self.donor_id))
    }

    pub fn signature_verified(&self) -> bool {
        self.donor.as_ref().is_some_and(|d| d.signature_verified)
    }
}
