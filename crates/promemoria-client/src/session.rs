//! Session file: the pending authorization between two invocations.
//!
//! The first run that needs consent writes the PKCE verifier and state here;
//! the run that receives the callback reads them back. Nothing else is kept.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use promemoria_providers::google::AuthSession;

use crate::error::ClientResult;

/// A pending authorization older than this is discarded on load.
pub const PENDING_TTL_HOURS: i64 = 1;

/// Reads and writes the [`AuthSession`] file.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Creates a session file handle.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the session.
    ///
    /// A missing or unreadable file yields a fresh session. A stale pending
    /// authorization is dropped so its state can no longer be matched.
    pub fn load(&self) -> AuthSession {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return AuthSession::new(),
            Err(e) => {
                warn!("could not read session file {:?}: {}", self.path, e);
                return AuthSession::new();
            }
        };

        let mut session: AuthSession = match serde_json::from_str(&content) {
            Ok(session) => session,
            Err(e) => {
                warn!("ignoring corrupt session file {:?}: {}", self.path, e);
                return AuthSession::new();
            }
        };

        if let Some(pending) = session.pending()
            && Utc::now() - pending.created_at > Duration::hours(PENDING_TTL_HOURS)
        {
            info!("pending authorization from {} expired", pending.created_at);
            session.clear_pending();
        }

        debug!("loaded session from {:?}", self.path);
        session
    }

    /// Writes the session, or removes the file when nothing is pending.
    pub fn save(&self, session: &AuthSession) -> ClientResult<()> {
        if session.pending().is_none() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(session)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)) {
                warn!("could not restrict permissions on {:?}: {}", self.path, e);
            }
        }

        debug!("saved session to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promemoria_providers::google::PendingAuthorization;
    use tempfile::TempDir;

    fn pending_json(created_at: chrono::DateTime<Utc>) -> String {
        let pending = PendingAuthorization {
            state: "state-1".to_string(),
            verifier: "verifier-1".to_string(),
            created_at,
        };
        serde_json::json!({ "pending": pending }).to_string()
    }

    #[test]
    fn missing_file_is_fresh_session() {
        let dir = TempDir::new().unwrap();
        let session = SessionFile::new(dir.path().join("session.json")).load();
        assert!(session.pending().is_none());
    }

    #[test]
    fn pending_survives_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, pending_json(Utc::now())).unwrap();

        let file = SessionFile::new(&path);
        let session = file.load();
        assert_eq!(session.pending().unwrap().state, "state-1");

        file.save(&session).unwrap();
        assert_eq!(file.load().pending().unwrap().verifier, "verifier-1");
    }

    #[cfg(unix)]
    #[test]
    fn saved_session_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, pending_json(Utc::now())).unwrap();
        let file = SessionFile::new(&path);

        file.save(&file.load()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn stale_pending_is_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, pending_json(Utc::now() - Duration::hours(2))).unwrap();

        assert!(SessionFile::new(&path).load().pending().is_none());
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        assert!(SessionFile::new(&path).load().pending().is_none());
    }

    #[test]
    fn saving_without_pending_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, pending_json(Utc::now())).unwrap();

        SessionFile::new(&path).save(&AuthSession::new()).unwrap();
        assert!(!path.exists());
    }
}
