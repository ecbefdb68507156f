//! File-backed credential persistence.
//!
//! The credential is written as pretty JSON to a temporary sibling and then
//! renamed over the target, so a crash mid-write never leaves a half file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::google::credential::Credential;

/// Errors from the credential store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file could not be read, written, or removed.
    #[error("credential file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but is not a credential.
    #[error("credential file {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// The credential could not be serialized.
    #[error("failed to serialize credential: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<StoreError> for ProviderError {
    fn from(err: StoreError) -> Self {
        ProviderError::storage(err.to_string()).with_source(err)
    }
}

/// Durable storage for a single [`Credential`].
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Creates a store backed by `path`. Nothing is touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a credential file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the stored credential.
    ///
    /// Returns `Ok(None)` when no file exists and [`StoreError::Corrupt`]
    /// when the file cannot be parsed.
    pub fn load(&self) -> Result<Option<Credential>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no credential file at {:?}", self.path);
                return Ok(None);
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let credential = serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        debug!("loaded credential from {:?}", self.path);
        Ok(Some(credential))
    }

    /// Persists `credential`, replacing any previous one.
    pub fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(credential)?;
        let temp_path = self.path.with_extension("json.tmp");

        fs::write(&temp_path, content).map_err(|source| StoreError::Io {
            path: temp_path.clone(),
            source,
        })?;

        fs::rename(&temp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            if let Err(e) = fs::set_permissions(&self.path, perms) {
                warn!("could not restrict permissions on {:?}: {}", self.path, e);
            }
        }

        debug!("saved credential to {:?}", self.path);
        Ok(())
    }

    /// Deletes the stored credential. A missing file is not an error.
    pub fn remove(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("removed credential file {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn sample() -> Credential {
        Credential {
            access_token: "ya29.test".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            client_id: "id.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
            scopes: BTreeSet::from(["scope".to_string()]),
            expiry: NaiveDate::from_ymd_opt(2025, 10, 11)
                .and_then(|d| d.and_hms_opt(8, 0, 0)),
        }
    }

    #[test]
    fn missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));
        assert!(store.load().unwrap().is_none());
        assert!(!store.exists());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("nested").join("token.json"));

        store.save(&sample()).unwrap();
        assert!(store.exists());
        assert!(!dir.path().join("nested").join("token.json.tmp").exists());
        assert_eq!(store.load().unwrap(), Some(sample()));
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));
        store.save(&sample()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "{ not json").unwrap();

        let err = CredentialStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));
        store.save(&sample()).unwrap();

        store.remove().unwrap();
        assert!(!store.exists());
        store.remove().unwrap();
    }

    #[test]
    fn converts_to_storage_provider_error() {
        let err: ProviderError = StoreError::Corrupt {
            path: PathBuf::from("token.json"),
            reason: "eof".to_string(),
        }
        .into();
        assert_eq!(err.code(), crate::error::ProviderErrorCode::StorageError);
    }
}
