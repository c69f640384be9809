mod store;

pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

use crate::error::{Error, SessionError};
use crate::log::SESSION;
use crate::model::EntityId;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tracing::info;

///
/// Role-scoped section of OrganLink. Each portal authenticates independently.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Portal {
    #[serde(alias = "Hospital", alias = "HOSPITAL")]
    Hospital,
    #[serde(alias = "Organization", alias = "ORGANIZATION")]
    Organization,
    #[serde(alias = "Admin", alias = "ADMIN")]
    Admin,
}

impl Portal {
    pub const ALL: [Portal; 3] = [Portal::Hospital, Portal::Organization, Portal::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Portal::Hospital => "hospital",
            Portal::Organization => "organization",
            Portal::Admin => "admin",
        }
    }

    /// Key the bearer token is stored under
    pub fn token_key(self) -> &'static str {
        match self {
            Portal::Hospital => "hospital_token",
            Portal::Organization => "organization_token",
            Portal::Admin => "admin_token",
        }
    }

    /// Path prefix of the portal's API routes
    pub fn api_prefix(self) -> &'static str {
        match self {
            Portal::Hospital => "/api/hospital",
            Portal::Organization => "/api/organization",
            Portal::Admin => "/api/admin",
        }
    }
}

impl Display for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// Signed-in user as returned by the portal's login endpoint
///
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SessionUser {
    #[serde(default, deserialize_with = "crate::model::de::lenient_opt")]
    pub id: Option<EntityId>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "crate::model::de::lenient_opt")]
    pub hospital_id: Option<EntityId>,

    #[serde(default, deserialize_with = "crate::model::de::lenient_opt")]
    pub organization_id: Option<EntityId>,

    #[serde(default)]
    pub role: Option<String>,
}

///
/// Session state for one portal, shared by everything acting on the user's behalf.
///
/// Holds the token store handle and the in-memory user projection.
/// Sign-out clears both and notifies subscribers.
///
#[derive(Clone)]
pub struct Session {
    portal: Portal,
    store: Arc<dyn TokenStore>,
    user: Arc<RwLock<Option<SessionUser>>>,
    signed_in: Arc<watch::Sender<bool>>,
}

impl Session {
    ///
    /// A session is signed in from the start if the store already holds a token for the portal
    ///
    pub fn new(portal: Portal, store: Arc<dyn TokenStore>) -> Result<Session, Error> {
        let signed_in = store.load(portal)?.is_some();
        let (sender, _) = watch::channel(signed_in);

        Ok(Session {
            portal,
            store,
            user: Arc::new(RwLock::new(None)),
            signed_in: Arc::new(sender),
        })
    }

    pub fn portal(&self) -> Portal {
        self.portal
    }

    pub fn sign_in(&self, token: &str, user: Option<SessionUser>) -> Result<(), Error> {
        self.store.save(self.portal, token)?;
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
        self.signed_in.send_replace(true);

        info!(target: SESSION, msg = "Signed in", portal = %self.portal);
        Ok(())
    }

    pub fn sign_out(&self) -> Result<(), Error> {
        // Clear the in-memory projection even if the store fails
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = None;
        let cleared = self.store.clear(self.portal);
        self.signed_in.send_replace(false);

        info!(target: SESSION, msg = "Signed out", portal = %self.portal);
        cleared
    }

    ///
    /// Bearer token for the portal, read from the store on every call
    ///
    pub fn token(&self) -> Result<String, Error> {
        match self.store.load(self.portal)? {
            Some(token) => Ok(token),
            None => Err(SessionError::NotAuthenticated {
                portal: self.portal,
            }
            .into()),
        }
    }

    ///
    /// Re-reads the token store and publishes the sign-in state if it changed.
    ///
    /// Picks up a login or logout made by another process sharing the store.
    /// Returns whether the portal is signed in.
    ///
    pub fn sync(&self) -> Result<bool, Error> {
        let stored = self.store.load(self.portal)?.is_some();

        let changed = self.signed_in.send_if_modified(|signed_in| {
            if *signed_in == stored {
                return false;
            }
            *signed_in = stored;
            true
        });

        if changed {
            if !stored {
                *self.user.write().unwrap_or_else(PoisonError::into_inner) = None;
            }
            info!(target: SESSION, msg = "Sign-in state changed in the token store", portal = %self.portal, signed_in = stored);
        }

        Ok(stored)
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_signed_in(&self) -> bool {
        *self.signed_in.borrow()
    }

    ///
    /// Receives `true` on sign-in and `false` on sign-out
    ///
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.signed_in.subscribe()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("portal", &self.portal)
            .field("signed_in", &self.is_signed_in())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restores_existing_token() {
        let store = Arc::new(MemoryTokenStore::with_token(Portal::Hospital, "secret"));
        let session = Session::new(Portal::Hospital, store.clone()).unwrap();

        assert!(session.is_signed_in());
        assert_eq!(session.token().unwrap(), "secret");

        let admin = Session::new(Portal::Admin, store).unwrap();
        assert!(!admin.is_signed_in());
        assert!(matches!(
            admin.token(),
            Err(Error::Session(SessionError::NotAuthenticated {
                portal: Portal::Admin
            }))
        ));
    }

    #[test]
    fn sign_out_clears_token_and_user() {
        let store = Arc::new(MemoryTokenStore::new());
        let session = Session::new(Portal::Hospital, store.clone()).unwrap();
        let mut signed_in = session.subscribe();

        let user = SessionUser {
            name: Some("Dr. Ada Obi".to_string()),
            hospital_id: Some(EntityId::Number(3)),
            ..Default::default()
        };

        session.sign_in("secret", Some(user.clone())).unwrap();
        assert!(*signed_in.borrow_and_update());
        assert_eq!(session.user(), Some(user));

        session.sign_out().unwrap();
        assert!(!*signed_in.borrow_and_update());
        assert_eq!(session.user(), None);
        assert!(session.token().is_err());
        assert_eq!(store.load(Portal::Hospital).unwrap(), None);
    }

    #[test]
    fn sync_picks_up_changes_from_another_session() {
        let store = Arc::new(MemoryTokenStore::new());
        let watcher = Session::new(Portal::Admin, store.clone()).unwrap();
        let other = Session::new(Portal::Admin, store).unwrap();
        let mut signed_in = watcher.subscribe();

        other.sign_in("secret", None).unwrap();
        assert!(!watcher.is_signed_in());

        assert!(watcher.sync().unwrap());
        assert!(signed_in.has_changed().unwrap());
        assert!(*signed_in.borrow_and_update());

        // Unchanged state publishes nothing
        assert!(watcher.sync().unwrap());
        assert!(!signed_in.has_changed().unwrap());

        other.sign_out().unwrap();
        assert!(!watcher.sync().unwrap());
        assert!(!*signed_in.borrow_and_update());
    }

    #[test]
    fn portal_keys() {
        assert_eq!(Portal::Hospital.token_key(), "hospital_token");
        assert_eq!(Portal::Organization.token_key(), "organization_token");
        assert_eq!(Portal::Admin.token_key(), "admin_token");
        assert_eq!(Portal::Organization.api_prefix(), "/api/organization");
    }
}
