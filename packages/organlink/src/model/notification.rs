use super::{de, EntityId, MatchCandidate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Notification {
    pub notification_id: EntityId,

    #[serde(rename = "type", default, deserialize_with = "de::lenient_or_default")]
    pub kind: NotificationKind,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub is_read: bool,

    #[serde(default, deserialize_with = "de::lenient_opt")]
    pub related_id: Option<EntityId>,

    /// Never fails to deserialize: malformed metadata is `None`
    #[serde(default, deserialize_with = "de::lenient_metadata")]
    pub metadata: Option<Value>,

    #[serde(default, deserialize_with = "de::lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[serde(alias = "new_match_request", alias = "match_request_received")]
    MatchRequest,
    #[serde(alias = "match_request_accepted")]
    MatchAccepted,
    #[serde(alias = "match_request_rejected", alias = "match_declined")]
    MatchRejected,
    MatchCompleted,
    #[serde(alias = "ai_match", alias = "new_match")]
    MatchFound,
    #[serde(alias = "policy_vote", alias = "policy_created", alias = "policy_update")]
    Policy,
    System,
    #[default]
    #[serde(other)]
    Other,
}

impl NotificationKind {
    pub fn is_match_related(self) -> bool {
        matches!(
            self,
            NotificationKind::MatchRequest
                | NotificationKind::MatchAccepted
                | NotificationKind::MatchRejected
                | NotificationKind::MatchCompleted
                | NotificationKind::MatchFound
        )
    }
}

impl Notification {
    pub fn request_id(&self) -> Option<EntityId> {
        resolve_request_id(
            self.metadata.as_ref(),
            self.related_id.as_ref(),
            Some(&self.notification_id),
            None,
        )
    }

    pub fn embedded_matches(&self) -> Vec<MatchCandidate> {
        embedded_matches(self.metadata.as_ref())
    }
}

///
/// Resolves the match request a notification refers to.
///
/// Notification payloads are not consistent about where the request id lives.
/// Precedence, first present wins:
///
///   metadata.request_id
///   metadata.requestId
///   related_id
///   notification_id
///   local id
///
pub fn resolve_request_id(
    metadata: Option<&Value>,
    related_id: Option<&EntityId>,
    notification_id: Option<&EntityId>,
    local_id: Option<&EntityId>,
) -> Option<EntityId> {
    let from_metadata = metadata.and_then(|metadata| {
        ["request_id", "requestId"]
            .iter()
            .find_map(|key| metadata.get(key).and_then(EntityId::from_value))
    });

    from_metadata
        .or_else(|| related_id.cloned())
        .or_else(|| notification_id.cloned())
        .or_else(|| local_id.cloned())
}

///
/// Match candidates embedded in notification metadata under `matches`.
/// Entries that do not parse are skipped.
///
pub fn embedded_matches(metadata: Option<&Value>) -> Vec<MatchCandidate> {
    metadata
        .and_then(|metadata| metadata.get("matches"))
        .and_then(Value::as_array)
        .map(|matches| {
            matches
                .iter()
                .filter_map(|m| serde_json::from_value(m.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
