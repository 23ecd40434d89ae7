//! Session token and cached user identity.
//!
//! A [`Session`] is passed explicitly to every request-issuing call; there is
//! no process-wide token. Stores are shared between clones of a session, so a
//! 401 observed by one request is visible to the next one.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Persisted session state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Opaque bearer token.
    #[serde(default)]
    pub token: Option<String>,
    /// Cached user identity as returned by the backend at login.
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

/// Client-side persistent storage for [`SessionData`].
pub trait SessionStore: Send + Sync {
    /// Read the current state. Unreadable state is treated as empty.
    fn load(&self) -> SessionData;

    /// Replace the stored state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the state cannot be persisted.
    fn save(&self, data: &SessionData) -> Result<(), SessionError>;

    /// Remove token and user. Clearing an empty store is a no-op.
    fn clear(&self);
}

/// In-memory store, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    data: RwLock<SessionData>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> SessionData {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, data: &SessionData) -> Result<(), SessionError> {
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = data.clone();
        Ok(())
    }

    fn clear(&self) {
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = SessionData::default();
    }
}

/// JSON file store.
///
/// File layout:
/// ```text
/// { "token": "…", "user": { … } }
/// ```
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store backed by the file at `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> SessionData {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return SessionData::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to read session: {e}");
                return SessionData::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), "ignoring corrupt session file: {e}");
            SessionData::default()
        })
    }

    fn save(&self, data: &SessionData) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(data)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "session file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), "failed to clear session: {e}"),
        }
    }
}

/// Handle to the current session, cheap to clone.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl Session {
    /// Wrap an existing store.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Fresh anonymous session held in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    /// Session persisted to a JSON file.
    #[must_use]
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileSessionStore::new(path)))
    }

    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.store.load().token
    }

    /// Cached user identity.
    #[must_use]
    pub fn user(&self) -> Option<serde_json::Value> {
        self.store.load().user
    }

    /// Record a successful login.
    pub fn store_login(
        &self,
        token: impl Into<String>,
        user: Option<serde_json::Value>,
    ) -> Result<(), SessionError> {
        self.store.save(&SessionData {
            token: Some(token.into()),
            user,
        })
    }

    /// Drop token and cached user. Safe to call repeatedly.
    pub fn invalidate(&self) {
        self.store.clear();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.token().is_some())
            .finish()
    }
}
