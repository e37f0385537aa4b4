//! Session storage
//!
//! The token and the profile it was issued for are one value: they are
//! written together, read together and cleared together. A stored document
//! holding only one of them is treated as no session at all.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use biocloud_common::{Result, Session, UserProfile};

/// Durable holder of the current session
pub trait SessionStore: Send + Sync {
    /// Replace the stored session
    fn save(&self, session: &Session) -> Result<()>;

    /// Current session, or `None` when logged out
    fn read(&self) -> Option<Session>;

    /// Remove token and profile
    fn clear(&self) -> Result<()>;
}

/// Shared handle passed to everything that needs the session
pub type SessionContext = Arc<dyn SessionStore>;

/// On-disk layout, keyed the same way as the web client's local storage
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    token: Option<String>,
    #[serde(rename = "userProfile")]
    user_profile: Option<UserProfile>,
}

/// Session persisted as a single JSON file
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, contents: &[u8]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        // Same directory so the rename cannot cross filesystems. The temp file
        // is created owner-only.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        let _guard = self.lock.lock();
        let doc = StoredSession {
            token: Some(session.token.clone()),
            user_profile: Some(session.profile.clone()),
        };
        self.write_atomic(&serde_json::to_vec_pretty(&doc)?)?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn read(&self) -> Option<Session> {
        let _guard = self.lock.lock();
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read session file");
                return None;
            }
        };

        match serde_json::from_slice::<StoredSession>(&raw) {
            Ok(StoredSession {
                token: Some(token),
                user_profile: Some(profile),
            }) if !token.is_empty() => Some(Session::new(token, profile)),
            Ok(_) => {
                warn!(path = %self.path.display(), "Discarding incomplete session");
                let _ = self.remove();
                None
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding corrupt session");
                let _ = self.remove();
                None
            }
        }
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock();
        self.remove()?;
        debug!(path = %self.path.display(), "Session cleared");
        Ok(())
    }
}

/// Session kept in process memory only
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        *self.session.lock() = Some(session.clone());
        Ok(())
    }

    fn read(&self) -> Option<Session> {
        self.session.lock().clone()
    }

    fn clear(&self) -> Result<()> {
        *self.session.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            "token-123",
            UserProfile {
                id: 3,
                email: "ana@example.com".into(),
                name: "Ana".into(),
                credits: 5,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_file_store_save_read_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert!(store.read().is_none());
        store.save(&session()).unwrap();
        assert_eq!(store.read(), Some(session()));

        store.clear().unwrap();
        assert!(store.read().is_none());
        assert!(!store.path().exists());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_uses_web_storage_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&session()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(raw["token"], "token-123");
        assert_eq!(raw["userProfile"]["email"], "ana@example.com");
    }

    #[test]
    fn test_partial_document_is_absent_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"token": "orphan"}"#).unwrap();

        let store = FileSessionStore::new(&path);
        assert!(store.read().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_document_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();

        assert!(FileSessionStore::new(&path).read().is_none());
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.read().is_none());
        store.save(&session()).unwrap();
        assert_eq!(store.read().map(|s| s.token), Some("token-123".to_string()));
        store.clear().unwrap();
        assert!(store.read().is_none());
    }
}
