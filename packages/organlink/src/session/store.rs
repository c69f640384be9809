use super::Portal;
use crate::error::{Error, SessionError};
use crate::log::SESSION;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

///
/// Persistent bearer tokens, one per portal
///
pub trait TokenStore: Send + Sync {
    fn load(&self, portal: Portal) -> Result<Option<String>, Error>;

    fn save(&self, portal: Portal, token: &str) -> Result<(), Error>;

    fn clear(&self, portal: Portal) -> Result<(), Error>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<Portal, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(portal: Portal, token: &str) -> Self {
        let store = Self::new();
        store
            .tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(portal, token.to_string());
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self, portal: Portal) -> Result<Option<String>, Error> {
        let tokens = self.tokens.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tokens.get(&portal).cloned())
    }

    fn save(&self, portal: Portal, token: &str) -> Result<(), Error> {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        tokens.insert(portal, token.to_string());
        Ok(())
    }

    fn clear(&self, portal: Portal) -> Result<(), Error> {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        tokens.remove(&portal);
        Ok(())
    }
}

///
/// Tokens kept in a JSON file keyed by the portal token key
///
///   { "hospital_token": "...", "admin_token": "..." }
///
/// The file is read on every lookup so a token written by another process is picked up.
///
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

type TokenFile = BTreeMap<String, String>;

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileTokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<TokenFile, Error> {
        if !self.path.exists() {
            return Ok(TokenFile::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(TokenFile::new());
        }

        let tokens = serde_json::from_str(&contents).map_err(SessionError::Store)?;
        Ok(tokens)
    }

    fn write(&self, tokens: &TokenFile) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string_pretty(tokens).map_err(SessionError::Store)?;
        fs::write(&self.path, contents)?;

        debug!(target: SESSION, msg = "Token file written", path = ?self.path);
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self, portal: Portal) -> Result<Option<String>, Error> {
        let tokens = self.read()?;
        Ok(tokens
            .get(portal.token_key())
            .filter(|token| !token.is_empty())
            .cloned())
    }

    fn save(&self, portal: Portal, token: &str) -> Result<(), Error> {
        let mut tokens = self.read()?;
        tokens.insert(portal.token_key().to_string(), token.to_string());
        self.write(&tokens)
    }

    fn clear(&self, portal: Portal) -> Result<(), Error> {
        let mut tokens = self.read()?;
        if tokens.remove(portal.token_key()).is_some() {
            self.write(&tokens)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_token_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "organlink-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir.join("tokens.json")
    }

    #[test]
    fn file_store_keeps_portals_apart() {
        let path = temp_token_file("portals");
        let store = FileTokenStore::new(&path);

        assert_eq!(store.load(Portal::Hospital).unwrap(), None);

        store.save(Portal::Hospital, "hospital-secret").unwrap();
        store.save(Portal::Admin, "admin-secret").unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(
            reopened.load(Portal::Hospital).unwrap().as_deref(),
            Some("hospital-secret")
        );
        assert_eq!(
            reopened.load(Portal::Admin).unwrap().as_deref(),
            Some("admin-secret")
        );
        assert_eq!(reopened.load(Portal::Organization).unwrap(), None);

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"hospital_token\""));

        reopened.clear(Portal::Hospital).unwrap();
        assert_eq!(store.load(Portal::Hospital).unwrap(), None);
        assert_eq!(
            store.load(Portal::Admin).unwrap().as_deref(),
            Some("admin-secret")
        );

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_is_a_session_error() {
        let path = temp_token_file("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let store = FileTokenStore::new(&path);
        let result = store.load(Portal::Hospital);
        assert!(matches!(result, Err(Error::Session(SessionError::Store(_)))));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn memory_store() {
        let store = MemoryTokenStore::with_token(Portal::Organization, "org-secret");
        assert_eq!(
            store.load(Portal::Organization).unwrap().as_deref(),
            Some("org-secret")
        );
        store.clear(Portal::Organization).unwrap();
        assert_eq!(store.load(Portal::Organization).unwrap(), None);
    }
}
