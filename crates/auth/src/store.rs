//! Durable credential persistence with silent in-memory fallback
//!
//! Persists exactly one record: the raw credential plus the derived
//! profile. The backing file is optional; any storage failure degrades to
//! memory-only behavior for the rest of the process and is never surfaced
//! to callers.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::types::UserProfile;

/// The persisted credential record: raw token plus derived profile,
/// always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub id_token: String,
    pub profile: Option<UserProfile>,
}

/// Key-value persistence for the credential record.
pub struct CredentialStore {
    path: Option<PathBuf>,
    cache: Mutex<Option<StoredCredential>>,
}

impl CredentialStore {
    /// Create a store backed by `path`, hydrating the cache from any
    /// existing file. Unreadable or corrupt files are treated as empty.
    pub fn new(path: Option<PathBuf>) -> Self {
        let cache = path.as_deref().and_then(read_record);
        Self {
            path,
            cache: Mutex::new(cache),
        }
    }

    /// Create a store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Current credential record, if any.
    pub fn get(&self) -> Option<StoredCredential> {
        self.lock().clone()
    }

    /// Raw credential string, if one is held.
    pub fn token(&self) -> Option<String> {
        self.lock().as_ref().map(|c| c.id_token.clone())
    }

    /// Persisted profile, if one is held.
    pub fn profile(&self) -> Option<UserProfile> {
        self.lock().as_ref().and_then(|c| c.profile.clone())
    }

    /// Replace the stored record. Persistence failures are logged and
    /// swallowed; the in-memory value always reflects the write.
    pub fn set(&self, credential: StoredCredential) {
        if let Some(path) = self.path.as_deref() {
            write_record(path, &credential);
        }
        *self.lock() = Some(credential);
    }

    /// Remove both the cached and the persisted record.
    pub fn clear(&self) {
        if let Some(path) = self.path.as_deref() {
            if path.exists() {
                if let Err(err) = fs::remove_file(path) {
                    tracing::warn!(error = %err, path = %path.display(), "Failed to remove credential file");
                }
            }
        }
        *self.lock() = None;
    }

    fn lock(&self) -> MutexGuard<'_, Option<StoredCredential>> {
        // Writes are whole-value replacements, so a poisoned lock still
        // holds a consistent record.
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn read_record(path: &Path) -> Option<StoredCredential> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "Failed to read credential file");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(record) => Some(record),
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "Ignoring corrupt credential file");
            None
        }
    }
}

fn write_record(path: &Path, credential: &StoredCredential) {
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!(error = %err, path = %path.display(), "Credential store degraded to memory-only");
            return;
        }
    }
    let json = match serde_json::to_vec_pretty(credential) {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to serialize credential record");
            return;
        }
    };
    if let Err(err) = fs::write(path, json) {
        tracing::warn!(error = %err, path = %path.display(), "Credential store degraded to memory-only");
    }
}
