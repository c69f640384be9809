use crate::{
    error::Error,
    log::NOTIFY,
    notify::NotificationCenter,
    prometheus,
    session::TokenStore,
    OrganLinkConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

///
/// Polls notifications for every portal until SIGINT or SIGTERM.
///
/// Portals without a stored token wait for one, so `organlink login` in another terminal
/// starts polling without a restart.
///
pub async fn run(config: &OrganLinkConfig, store: Arc<dyn TokenStore>) -> Result<i32, Error> {
    if config.prometheus_enabled() {
        prometheus::start("0.0.0.0", config.prometheus.port)?;
    }

    let cancel = CancellationToken::new();
    let center = NotificationCenter::connect(config, store, cancel.clone())?;

    let printers = TaskTracker::new();
    for poller in center.pollers() {
        let mut changes = poller.subscribe();
        let cancel = cancel.clone();

        printers.spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = changes.borrow_and_update().clone();
                        if let Some(fetched_at) = snapshot.fetched_at {
                            println!(
                                "{} {:<12} {} unread",
                                fetched_at.format("%H:%M:%S"),
                                snapshot.portal,
                                snapshot.unread_count
                            );
                        }
                    }
                }
            }
        });
    }
    printers.close();

    info!(
        target: NOTIFY,
        msg = "Watching notifications",
        interval = ?config.notifications.poll_interval()
    );

    tokio::select! {
        _ = sigint() => info!(msg = "Received SIGINT"),
        _ = sigterm() => info!(msg = "Received SIGTERM"),
    }

    center.shutdown(SHUTDOWN_TIMEOUT).await;
    printers.wait().await;

    Ok(exitcode::OK)
}

async fn sigint() -> std::io::Result<()> {
    signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}

async fn sigterm() -> std::io::Result<()> {
    signal(SignalKind::terminate())?.recv().await;
    Ok(())
}
