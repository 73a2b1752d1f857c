//! Persisted user session.
//!
//! The session lives in a small durable key/value store, the native
//! counterpart of browser local storage: the access token under
//! [`TOKEN_KEY`] and the JSON-encoded user under [`USER_KEY`]. It is created
//! by a successful login, read by every authenticated call and removed only
//! by logout.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use tracing::warn;
use visit_panel_core::User;

use crate::error::ClientResult;

/// Storage key of the access token.
pub const TOKEN_KEY: &str = "vp_token";
/// Storage key of the JSON-encoded user record.
pub const USER_KEY: &str = "vp_user";

/// String key/value store with local-storage semantics.
pub trait LocalStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the backing storage cannot be read.
    fn get_item(&self, key: &str) -> io::Result<Option<String>>;

    /// Write several values in one step. Either all of them are stored or
    /// none is.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the backing storage cannot be written.
    fn set_items(&self, items: &[(&str, &str)]) -> io::Result<()>;

    /// Remove several values in one step. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the backing storage cannot be written.
    fn remove_items(&self, keys: &[&str]) -> io::Result<()>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the backing storage cannot be written.
    fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        self.set_items(&[(key, value)])
    }

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the backing storage cannot be written.
    fn remove_item(&self, key: &str) -> io::Result<()> {
        self.remove_items(&[key])
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_items(&self, entries: &[(&str, &str)]) -> io::Result<()> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in entries {
            items.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_items(&self, keys: &[&str]) -> io::Result<()> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            items.remove(*key);
        }
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// Every write replaces the file through a temporary sibling and a rename,
/// so a crash never leaves a half-written file behind. A file that cannot
/// be parsed is treated as empty and overwritten on the next write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_map(&self) -> io::Result<BTreeMap<String, String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e),
        };

        match serde_json::from_str(&contents) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Session file is corrupt, ignoring it");
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(map).map_err(io::Error::other)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)
    }
}

impl LocalStore for FileStore {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_map()?.remove(key))
    }

    fn set_items(&self, items: &[(&str, &str)]) -> io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map()?;
        for (key, value) in items {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.write_map(&map)
    }

    fn remove_items(&self, keys: &[&str]) -> io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map()?;
        let before = map.len();
        for key in keys {
            map.remove(*key);
        }
        if map.len() != before {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// A logged-in user: bearer token plus the user record returned at login.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: SecretString,
    pub user: User,
}

impl Session {
    #[must_use]
    pub fn new(access_token: impl Into<String>, user: User) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            user,
        }
    }
}

/// Reads and writes the session keys of a [`LocalStore`].
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn LocalStore>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Session store persisted at `path`.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(path)))
    }

    /// Session store that lives only as long as the process.
    #[must_use]
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The stored access token, if any. Empty tokens count as absent.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the store cannot be read.
    pub fn token(&self) -> ClientResult<Option<SecretString>> {
        Ok(self
            .store
            .get_item(TOKEN_KEY)?
            .filter(|token| !token.is_empty())
            .map(SecretString::from))
    }

    /// The stored user record, if any and readable.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the store cannot be read.
    pub fn user(&self) -> ClientResult<Option<User>> {
        let Some(raw) = self.store.get_item(USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "Stored user record is unreadable");
                Ok(None)
            }
        }
    }

    /// The full session, when both keys are present.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the store cannot be read.
    pub fn load(&self) -> ClientResult<Option<Session>> {
        let Some(access_token) = self.token()? else {
            return Ok(None);
        };
        Ok(self.user()?.map(|user| Session { access_token, user }))
    }

    /// Persist a session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the store cannot be written.
    pub fn save(&self, session: &Session) -> ClientResult<()> {
        let user = serde_json::to_string(&session.user)?;
        self.store.set_items(&[
            (TOKEN_KEY, session.access_token.expose_secret()),
            (USER_KEY, &user),
        ])?;
        Ok(())
    }

    /// Remove both session keys.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the store cannot be written.
    pub fn clear(&self) -> ClientResult<()> {
        self.store.remove_items(&[TOKEN_KEY, USER_KEY])?;
        Ok(())
    }

    /// Whether a token is stored. Storage failures count as logged out.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.token().ok().flatten().is_some()
    }
}
