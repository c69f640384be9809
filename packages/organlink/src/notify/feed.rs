use crate::api::ApiClient;
use crate::error::Error;
use crate::log::NOTIFY;
use crate::model::{EntityId, Notification};
use crate::session::{Portal, Session};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

///
/// Notifications as returned by `GET /api/{portal}/notifications`
///
///   { "notifications": [...], "unread_count": 3 }
///
/// A bare array is accepted too. A missing unread count is computed from the list.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

impl NotificationList {
    pub fn from_value(value: Value) -> Self {
        let (items, unread_count) = match value {
            Value::Array(items) => (items, None),
            Value::Object(mut object) => {
                let items = match object.remove("notifications") {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                };
                let unread_count = object.get("unread_count").and_then(count);
                (items, unread_count)
            }
            _ => (Vec::new(), None),
        };

        let notifications: Vec<Notification> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(notification) => Some(notification),
                Err(err) => {
                    warn!(target: NOTIFY, msg = "Skipping malformed notification", error = err.to_string());
                    None
                }
            })
            .collect();

        let unread_count = unread_count
            .unwrap_or_else(|| notifications.iter().filter(|n| !n.is_read).count());

        NotificationList {
            notifications,
            unread_count,
        }
    }
}

fn count(value: &Value) -> Option<usize> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .map(|n| n as usize)
}

///
/// Latest notifications of a portal
///
#[derive(Clone, Debug, PartialEq)]
pub struct NotificationSnapshot {
    pub portal: Portal,
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl NotificationSnapshot {
    pub fn empty(portal: Portal) -> Self {
        NotificationSnapshot {
            portal,
            notifications: Vec::new(),
            unread_count: 0,
            fetched_at: None,
        }
    }

    pub fn fetched(portal: Portal, list: NotificationList) -> Self {
        NotificationSnapshot {
            portal,
            notifications: list.notifications,
            unread_count: list.unread_count,
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn unread(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().filter(|n| !n.is_read)
    }
}

///
/// Notification endpoints of one portal
///
#[derive(Clone, Debug)]
pub struct NotificationFeed {
    client: ApiClient,
}

impl NotificationFeed {
    pub fn new(client: ApiClient) -> Self {
        NotificationFeed { client }
    }

    pub fn portal(&self) -> Portal {
        self.client.portal()
    }

    pub fn session(&self) -> &Session {
        self.client.session()
    }

    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        NotificationFeed {
            client: self.client.with_cancellation(cancel),
        }
    }

    pub async fn fetch(&self) -> Result<NotificationList, Error> {
        let path = format!("{}/notifications", self.portal().api_prefix());
        let value: Value = self.client.get(&path).await?;
        Ok(NotificationList::from_value(value))
    }

    pub async fn mark_read(&self, notification_id: &EntityId) -> Result<(), Error> {
        let path = format!(
            "{}/notifications/{notification_id}/read",
            self.portal().api_prefix()
        );
        self.client.patch_ack(&path).await?;
        Ok(())
    }
}
