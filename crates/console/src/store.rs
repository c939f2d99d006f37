//! Session store: persistence of the bearer token across restarts.
//!
//! Only the auth session writes to a store. Everything else reads the
//! session through the auth session's published state.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tenantdesk_auth::{BearerToken, TokenValidationError, validate_expiry};

/// Token as persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredToken {
    pub token: BearerToken,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_at: Option<NaiveDateTime>,
}

impl StoredToken {
    pub fn new(token: BearerToken) -> Self {
        Self {
            token,
            token_type: None,
            expires_at: None,
        }
    }

    pub fn check_window(&self, now: NaiveDateTime) -> Result<(), TokenValidationError> {
        validate_expiry(self.expires_at, now)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("token store I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token store contents are malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredToken>, StoreError>;
    fn save(&self, token: &StoredToken) -> Result<(), StoreError>;
    /// Remove any persisted token. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), StoreError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed store
// ─────────────────────────────────────────────────────────────────────────────

/// JSON file holding a single [`StoredToken`].
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

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredToken>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err(e)),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, token: &StoredToken) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        // Write-then-rename so a crash never leaves a half-written token.
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(token)?;
        fs::write(&tmp, body).map_err(|e| self.io_err(e))?;
        restrict_permissions(&tmp).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local store (tests, ephemeral sessions).
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<StoredToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: StoredToken) -> Self {
        Self {
            slot: Mutex::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredToken>, StoreError> {
        Ok(self.slot.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    fn save(&self, token: &StoredToken) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = None;
        Ok(())
    }
}
