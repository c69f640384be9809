use crate::{
    api::ApiClient,
    error::{ConfigError, Error},
    log::SESSION,
    notify::NotificationFeed,
    session::{Portal, Session, TokenStore},
    OrganLinkConfig,
};
use std::sync::Arc;
use tracing::info;

pub fn login(portal: Portal, store: Arc<dyn TokenStore>, token: &str) -> Result<i32, Error> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ConfigError::MissingParameter {
            name: "token".to_string(),
        }
        .into());
    }

    let session = Session::new(portal, store)?;
    session.sign_in(token, None)?;

    info!(target: SESSION, msg = "Token stored", %portal);
    println!("Signed in to the {portal} portal");
    Ok(exitcode::OK)
}

pub fn logout(portal: Portal, store: Arc<dyn TokenStore>) -> Result<i32, Error> {
    let session = Session::new(portal, store)?;
    session.sign_out()?;

    info!(target: SESSION, msg = "Token removed", %portal);
    println!("Signed out of the {portal} portal");
    Ok(exitcode::OK)
}

///
/// Fetches the portal's notifications once and prints them, unread first marked with `*`
///
pub async fn notifications(
    config: &OrganLinkConfig,
    portal: Portal,
    store: Arc<dyn TokenStore>,
) -> Result<i32, Error> {
    let session = Session::new(portal, store)?;
    session.token()?;

    let feed = NotificationFeed::new(ApiClient::connect(&config.api, session)?);
    let list = feed.fetch().await?;

    for notification in &list.notifications {
        let marker = if notification.is_read { " " } else { "*" };
        let created_at = notification
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();

        println!(
            "{marker} {:>6}  {created_at:<16}  {}  {}",
            notification.notification_id,
            notification.title.as_deref().unwrap_or("-"),
            notification.message.as_deref().unwrap_or(""),
        );
    }

    println!("{} unread", list.unread_count);
    Ok(exitcode::OK)
}
