mod feed;
mod poller;

pub use feed::{NotificationFeed, NotificationList, NotificationSnapshot};
pub use poller::NotificationPoller;

use crate::api::ApiClient;
use crate::config::OrganLinkConfig;
use crate::error::Error;
use crate::log::NOTIFY;
use crate::session::{Portal, Session, TokenStore};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

///
/// One poller per portal, each independent of the others
///
pub struct NotificationCenter {
    pollers: Vec<NotificationPoller>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl NotificationCenter {
    pub fn new(cancel: CancellationToken) -> Self {
        NotificationCenter {
            pollers: Vec::new(),
            tracker: TaskTracker::new(),
            cancel,
        }
    }

    ///
    /// Pollers for every portal, sharing one token store
    ///
    pub fn connect(
        config: &OrganLinkConfig,
        store: Arc<dyn TokenStore>,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        let mut center = NotificationCenter::new(cancel);

        for portal in Portal::ALL {
            let session = Session::new(portal, store.clone())?;
            let client = ApiClient::connect(&config.api, session)?;
            let feed = NotificationFeed::new(client);
            center.start(NotificationPoller::new(
                feed,
                config.notifications.poll_interval(),
            ));
        }

        Ok(center)
    }

    pub fn start(&mut self, poller: NotificationPoller) {
        poller.spawn(&self.tracker, self.cancel.child_token());
        self.pollers.push(poller);
    }

    pub fn pollers(&self) -> &[NotificationPoller] {
        &self.pollers
    }

    pub fn poller(&self, portal: Portal) -> Option<&NotificationPoller> {
        self.pollers.iter().find(|p| p.portal() == portal)
    }

    pub fn total_unread(&self) -> usize {
        self.pollers.iter().map(NotificationPoller::unread_count).sum()
    }

    ///
    /// Stops every poller and waits up to `timeout` for them to finish
    ///
    pub async fn shutdown(self, timeout: Duration) {
        self.cancel.cancel();
        self.tracker.close();

        info!(target: NOTIFY, msg = "Waiting for notification pollers");

        if tokio::time::timeout(timeout, self.tracker.wait())
            .await
            .is_err()
        {
            warn!(
                target: NOTIFY,
                msg = "Notification pollers did not stop in time",
                count = self.tracker.len()
            );
        }
    }
}
