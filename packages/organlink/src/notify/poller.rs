use super::{NotificationFeed, NotificationSnapshot};
use crate::error::{Error, SessionError};
use crate::log::NOTIFY;
use crate::prometheus::{NOTIFICATIONS_UNREAD, NOTIFICATION_POLLS_TOTAL, NOTIFICATION_POLL_ERRORS_TOTAL};
use crate::session::Portal;
use arc_swap::ArcSwap;
use metrics::{counter, gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

///
/// Polls a portal's notifications on a fixed interval while its session is signed in.
///
/// The latest snapshot can be read without locking through `load`, and every new snapshot
/// is published to `subscribe` receivers. Signing out stops polling and clears the snapshot.
///
#[derive(Clone, Debug)]
pub struct NotificationPoller {
    feed: NotificationFeed,
    interval: Duration,
    snapshot: Arc<ArcSwap<NotificationSnapshot>>,
    changes: Arc<watch::Sender<Arc<NotificationSnapshot>>>,
}

impl NotificationPoller {
    pub fn new(feed: NotificationFeed, interval: Duration) -> Self {
        let empty = Arc::new(NotificationSnapshot::empty(feed.portal()));
        let (changes, _) = watch::channel(empty.clone());

        NotificationPoller {
            feed,
            interval,
            snapshot: Arc::new(ArcSwap::new(empty)),
            changes: Arc::new(changes),
        }
    }

    pub fn portal(&self) -> Portal {
        self.feed.portal()
    }

    pub fn feed(&self) -> &NotificationFeed {
        &self.feed
    }

    pub fn load(&self) -> Arc<NotificationSnapshot> {
        self.snapshot.load_full()
    }

    pub fn unread_count(&self) -> usize {
        self.snapshot.load().unread_count
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<NotificationSnapshot>> {
        self.changes.subscribe()
    }

    ///
    /// Fetches once and publishes the result
    ///
    pub async fn poll(&self) -> Result<(), Error> {
        counter!(NOTIFICATION_POLLS_TOTAL, "portal" => self.portal().as_str()).increment(1);

        let list = self.feed.fetch().await?;

        debug!(
            target: NOTIFY,
            msg = "Notifications polled",
            portal = %self.portal(),
            count = list.notifications.len(),
            unread = list.unread_count
        );

        self.publish(NotificationSnapshot::fetched(self.portal(), list));
        Ok(())
    }

    pub fn clear(&self) {
        self.publish(NotificationSnapshot::empty(self.portal()));
    }

    fn publish(&self, snapshot: NotificationSnapshot) {
        gauge!(NOTIFICATIONS_UNREAD, "portal" => self.portal().as_str())
            .set(snapshot.unread_count as f64);

        let snapshot = Arc::new(snapshot);
        self.snapshot.store(snapshot.clone());
        self.changes.send_replace(snapshot);
    }

    pub fn spawn(&self, tracker: &TaskTracker, cancel: CancellationToken) {
        let poller = NotificationPoller {
            feed: self.feed.with_cancellation(cancel.clone()),
            ..self.clone()
        };
        tracker.spawn(poller.run(cancel));
    }

    ///
    /// Polls until `cancel` fires.
    ///
    /// Waits for sign in, polls immediately and then every interval. No backoff is applied
    /// to failed polls. While signed out the token store is re-read every interval, and a poll
    /// rejected for a missing token counts as a sign-out, so a login or logout by another
    /// process sharing the store is picked up.
    ///
    pub async fn run(self, cancel: CancellationToken) {
        let mut signed_in = self.feed.session().subscribe();

        loop {
            let is_signed_in = *signed_in.borrow_and_update();

            if !is_signed_in {
                let mut check = tokio::time::interval(self.interval);
                check.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        changed = signed_in.changed() => {
                            if changed.is_err() {
                                return;
                            }
                            break;
                        }
                        _ = check.tick() => self.sync_session(),
                    }
                }
                continue;
            }

            info!(target: NOTIFY, msg = "Polling notifications", portal = %self.portal(), interval = ?self.interval);

            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(target: NOTIFY, msg = "Notification polling cancelled", portal = %self.portal());
                        return;
                    }
                    changed = signed_in.changed() => {
                        let is_signed_in = changed.is_ok() && *signed_in.borrow_and_update();
                        if !is_signed_in {
                            info!(target: NOTIFY, msg = "Signed out, notification polling stopped", portal = %self.portal());
                            self.clear();
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match self.poll().await {
                            Ok(()) => {}
                            Err(err) if err.is_cancelled() => {}
                            Err(Error::Session(SessionError::NotAuthenticated { .. })) => {
                                self.sync_session();
                                if !self.feed.session().is_signed_in() {
                                    info!(target: NOTIFY, msg = "Token removed, notification polling stopped", portal = %self.portal());
                                    self.clear();
                                    break;
                                }
                            }
                            Err(err) => {
                                counter!(NOTIFICATION_POLL_ERRORS_TOTAL, "portal" => self.portal().as_str()).increment(1);
                                warn!(target: NOTIFY, msg = "Notification poll failed", portal = %self.portal(), error = err.to_string());
                            }
                        }
                    }
                }
            }

            if signed_in.has_changed().is_err() {
                break;
            }
        }
    }

    fn sync_session(&self) {
        if let Err(err) = self.feed.session().sync() {
            warn!(target: NOTIFY, msg = "Token store could not be read", portal = %self.portal(), error = err.to_string());
        }
    }
}
