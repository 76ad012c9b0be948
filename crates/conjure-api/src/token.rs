// Bearer token storage
//
// The session token outlives a single process, so it lives behind a small
// storage trait. The API client reads it on every authenticated request;
// only login and logout write it.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::error::Error;

/// Durable key-value slot holding the current bearer token.
pub trait TokenStore: Send + Sync + fmt::Debug {
    /// The stored token, if any. Storage failures read as "no token".
    fn load(&self) -> Option<SecretString>;

    fn save(&self, token: &SecretString) -> Result<(), Error>;

    /// Remove the token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), Error>;
}

// ── In-memory ────────────────────────────────────────────────────────

/// Process-local token storage. Used by tests and one-off sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present = self.token.read().map(|t| t.is_some()).unwrap_or(false);
        f.debug_struct("MemoryTokenStore")
            .field("present", &present)
            .finish()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<SecretString> {
        let guard = self.token.read().ok()?;
        guard.as_deref().map(|t| SecretString::from(t.to_owned()))
    }

    fn save(&self, token: &SecretString) -> Result<(), Error> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| Error::TokenStorage("token lock poisoned".into()))?;
        *guard = Some(token.expose_secret().to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| Error::TokenStorage("token lock poisoned".into()))?;
        *guard = None;
        Ok(())
    }
}

// ── File-backed ──────────────────────────────────────────────────────

/// Token persisted to a single file, readable only by the owner on unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_for_write(&self) -> std::io::Result<std::fs::File> {
        let mut opts = std::fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        opts.open(&self.path)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<SecretString> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(SecretString::from(token.to_owned()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read token file");
                None
            }
        }
    }

    fn save(&self, token: &SecretString) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::TokenStorage(e.to_string()))?;
        }
        let mut file = self
            .open_for_write()
            .map_err(|e| Error::TokenStorage(e.to_string()))?;
        file.write_all(token.expose_secret().as_bytes())
            .map_err(|e| Error::TokenStorage(e.to_string()))?;
        debug!(path = %self.path.display(), "token saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "token removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::TokenStorage(e.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert!(store.load().is_none());

        store.save(&SecretString::from("abc".to_string())).unwrap();
        assert_eq!(store.load().unwrap().expose_secret(), "abc");

        store.clear().unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token");

        FileTokenStore::new(&path)
            .save(&SecretString::from("tok-1".to_string()))
            .unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.load().unwrap().expose_secret(), "tok-1");
    }

    #[test]
    fn file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token"));

        store.clear().unwrap();
        store.save(&SecretString::from("x".to_string())).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn blank_file_reads_as_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();
        assert!(FileTokenStore::new(path).load().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        FileTokenStore::new(&path)
            .save(&SecretString::from("secret".to_string()))
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
