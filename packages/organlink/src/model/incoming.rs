use super::notification::{embedded_matches, resolve_request_id};
use super::{de, EntityId, MatchCandidate, RequestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

///
/// An entry of the incoming matches list: another hospital asking to use one of our donors.
///
/// Entries are notification rows, so the match request id has to be resolved (see `request_id`).
///
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct IncomingMatch {
    #[serde(default, deserialize_with = "de::lenient_opt")]
    pub id: Option<EntityId>,

    #[serde(default, deserialize_with = "de::lenient_opt")]
    pub notification_id: Option<EntityId>,

    #[serde(default, deserialize_with = "de::lenient_opt")]
    pub related_id: Option<EntityId>,

    #[serde(default, deserialize_with = "de::lenient_metadata")]
    pub metadata: Option<Value>,

    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub is_read: bool,

    #[serde(default, deserialize_with = "de::lenient_opt")]
    pub status: Option<RequestStatus>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default, deserialize_with = "de::lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl IncomingMatch {
    ///
    /// Identity of the entry within the incoming list
    ///
    pub fn key(&self) -> Option<EntityId> {
        self.id
            .clone()
            .or_else(|| self.notification_id.clone())
            .or_else(|| self.related_id.clone())
    }

    pub fn request_id(&self) -> Option<EntityId> {
        resolve_request_id(
            self.metadata.as_ref(),
            self.related_id.as_ref(),
            self.notification_id.as_ref(),
            self.id.as_ref(),
        )
    }

    ///
    /// The notification to mark as read once the request has been answered
    ///
    pub fn source_notification(&self) -> Option<EntityId> {
        self.notification_id.clone().or_else(|| self.id.clone())
    }

    ///
    /// True if `id` names this entry, either by list identity or by match request id
    ///
    pub fn is_identified_by(&self, id: &EntityId) -> bool {
        self.key().as_ref() == Some(id) || self.request_id().as_ref() == Some(id)
    }

    pub fn embedded_matches(&self) -> Vec<MatchCandidate> {
        embedded_matches(self.metadata.as_ref())
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(key)?.as_str()
    }

    pub fn patient_name(&self) -> Option<&str> {
        self.metadata_str("patient_name")
    }

    pub fn requesting_hospital(&self) -> Option<&str> {
        self.metadata_str("requesting_hospital_name")
            .or_else(|| self.metadata_str("hospital_name"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_id_from_nested_metadata() {
        let item: IncomingMatch = serde_json::from_value(json!({
            "id": 100,
            "notification_id": 200,
            "related_id": 300,
            "metadata": {"request_id": 400, "patient_name": "Amara Okafor"},
            "is_read": false
        }))
        .unwrap();

        assert_eq!(item.key(), Some(EntityId::Number(100)));
        assert_eq!(item.request_id(), Some(EntityId::Number(400)));
        assert_eq!(item.source_notification(), Some(EntityId::Number(200)));
        assert_eq!(item.patient_name(), Some("Amara Okafor"));
        assert!(item.is_identified_by(&EntityId::Number(100)));
        assert!(item.is_identified_by(&EntityId::Number(400)));
        assert!(!item.is_identified_by(&EntityId::Number(300)));
    }

    #[test]
    fn falls_back_to_local_id() {
        let item: IncomingMatch = serde_json::from_value(json!({
            "id": 100,
            "metadata": "{broken",
            "status": "unknown"
        }))
        .unwrap();

        assert_eq!(item.metadata, None);
        assert_eq!(item.status, None);
        assert_eq!(item.request_id(), Some(EntityId::Number(100)));
        assert_eq!(item.source_notification(), Some(EntityId::Number(100)));
    }
}
