use super::{de, EntityId};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Patient {
    pub patient_id: EntityId,

    #[serde(default)]
    pub full_name: String,

    #[serde(default, deserialize_with = "de::lenient_opt_u32")]
    pub age: Option<u32>,

    #[serde(default)]
    pub gender: Option<String>,

    #[serde(default)]
    pub blood_type: Option<String>,

    #[serde(default)]
    pub organ_needed: Option<String>,

    #[serde(default, deserialize_with = "de::lenient_opt")]
    pub urgency_level: Option<UrgencyLevel>,

    #[serde(default, deserialize_with = "de::lenient_opt")]
    pub status: Option<PatientStatus>,
}

/// Unknown levels are `Other`, ordered below `Low`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum UrgencyLevel {
    #[serde(alias = "low", alias = "LOW")]
    Low = 1,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium = 2,
    #[serde(alias = "high", alias = "HIGH")]
    High = 3,
    #[serde(alias = "critical", alias = "CRITICAL")]
    Critical = 4,
    // serde requires `other` last; the discriminant keeps it ordered below `Low`
    #[serde(other)]
    Other = 0,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum PatientStatus {
    #[serde(alias = "waiting", alias = "WAITING")]
    Waiting,
    #[serde(
        rename = "In Progress",
        alias = "in_progress",
        alias = "InProgress",
        alias = "in progress"
    )]
    InProgress,
    #[serde(alias = "matched", alias = "MATCHED")]
    Matched,
    #[serde(alias = "completed", alias = "COMPLETED")]
    Completed,
    #[serde(other)]
    Other,
}

impl Patient {
    ///
    /// Patients without a status are treated as waiting.
    ///
    pub fn is_awaiting_match(&self) -> bool {
        matches!(self.status, None | Some(PatientStatus::Waiting))
    }
}

///
/// Patients that may be searched for donor matches, in server order.
///
pub fn awaiting_match(patients: &[Patient]) -> Vec<&Patient> {
    patients.iter().filter(|p| p.is_awaiting_match()).collect()
}

impl Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UrgencyLevel::Low => "Low",
            UrgencyLevel::Medium => "Medium",
            UrgencyLevel::High => "High",
            UrgencyLevel::Critical => "Critical",
            UrgencyLevel::Other => "Other",
        };
        write!(f, "{s}")
    }
}

impl Display for PatientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PatientStatus::Waiting => "Waiting",
            PatientStatus::InProgress => "In Progress",
            PatientStatus::Matched => "Matched",
            PatientStatus::Completed => "Completed",
            PatientStatus::Other => "Other",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patients() -> Vec<Patient> {
        serde_json::from_value(json!([
            {"patient_id": 1, "full_name": "Amara Okafor", "status": "Waiting", "urgency_level": "Critical"},
            {"patient_id": 2, "full_name": "Ben Ito", "status": "In Progress"},
            {"patient_id": 3, "full_name": "Chen Wei"},
            {"patient_id": "4", "full_name": "Dana Ruiz", "status": "Matched", "age": "61"},
            {"patient_id": 5, "full_name": "Eli Stone", "status": "Completed"},
            {"patient_id": 6, "full_name": "Fay Moss", "status": "On Hold"},
            {"patient_id": 7, "full_name": "Gus Lund", "status": "waiting", "urgency_level": "unknown"}
        ]))
        .unwrap()
    }

    #[test]
    fn only_waiting_or_unset_patients_are_searchable() {
        let patients = patients();
        let ids: Vec<_> = awaiting_match(&patients)
            .iter()
            .map(|p| p.patient_id.clone())
            .collect();

        assert_eq!(
            ids,
            vec![
                EntityId::Number(1),
                EntityId::Number(3),
                EntityId::Number(7)
            ]
        );
    }

    #[test]
    fn tolerates_unexpected_values() {
        let patients = patients();

        assert_eq!(patients[3].age, Some(61));
        assert_eq!(patients[5].status, Some(PatientStatus::Other));
        assert_eq!(patients[6].urgency_level, Some(UrgencyLevel::Other));
        assert!(UrgencyLevel::Other < UrgencyLevel::Low);
        assert_eq!(patients[0].urgency_level, Some(UrgencyLevel::Critical));
    }
}
