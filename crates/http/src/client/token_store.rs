//! Access and refresh token storage
//!
//! Stores are plain key-value holders. They never inspect token contents;
//! the refresh coordinator and the session are the only writers.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::warn;

use super::error::ClientError;

/// Storage key for the access token
pub const ACCESS_KEY: &str = "jt_access";
/// Storage key for the refresh token
pub const REFRESH_KEY: &str = "jt_refresh";

/// Holder for the credential pair
pub trait TokenStore: Send + Sync {
    fn access(&self) -> Option<String>;
    fn set_access(&self, token: &str);
    fn refresh(&self) -> Option<String>;
    fn set_refresh(&self, token: &str);
    /// Remove both tokens. Clearing an empty store is a no-op.
    fn clear(&self);
}

/// Credential pair as persisted under the fixed storage keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "jt_access", default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(rename = "jt_refresh", default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

impl Credentials {
    fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}

/// In-process token store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    credentials: RwLock<Credentials>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a credential pair
    pub fn with_tokens(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            credentials: RwLock::new(Credentials {
                access: Some(access.into()),
                refresh: Some(refresh.into()),
            }),
        }
    }

    fn update(&self, f: impl FnOnce(&mut Credentials)) {
        let mut credentials = self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut credentials);
    }

    fn snapshot(&self) -> Credentials {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn access(&self) -> Option<String> {
        self.snapshot().access
    }

    fn set_access(&self, token: &str) {
        self.update(|c| c.access = Some(token.to_string()));
    }

    fn refresh(&self) -> Option<String> {
        self.snapshot().refresh
    }

    fn set_refresh(&self, token: &str) {
        self.update(|c| c.refresh = Some(token.to_string()));
    }

    fn clear(&self) {
        self.update(|c| *c = Credentials::default());
    }
}

/// JSON-file token store that survives process restarts.
///
/// The file is read once on open; afterwards the in-memory copy is
/// authoritative and every mutation is written through. A failed write is
/// logged and does not fail the caller.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cache: MemoryTokenStore,
}

impl FileTokenStore {
    /// Open the store at `path`, loading any tokens already persisted there
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let credentials = match std::fs::read_to_string(&path) {
            Ok(data) if data.trim().is_empty() => Credentials::default(),
            Ok(data) => serde_json::from_str(&data)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Credentials::default(),
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path,
            cache: MemoryTokenStore {
                credentials: RwLock::new(credentials),
            },
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) {
        if let Err(err) = self.write_file(&self.cache.snapshot()) {
            warn!(path = %self.path.display(), error = %err, "Failed to persist tokens");
        }
    }

    fn write_file(&self, credentials: &Credentials) -> std::io::Result<()> {
        if credentials.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_string_pretty(credentials)?;
        std::fs::write(&self.path, data)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn access(&self) -> Option<String> {
        self.cache.access()
    }

    fn set_access(&self, token: &str) {
        self.cache.set_access(token);
        self.persist();
    }

    fn refresh(&self) -> Option<String> {
        self.cache.refresh()
    }

    fn set_refresh(&self, token: &str) {
        self.cache.set_refresh(token);
        self.persist();
    }

    fn clear(&self) {
        self.cache.clear();
        self.persist();
    }
}
