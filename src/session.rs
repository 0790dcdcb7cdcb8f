//! Persisted login session.
//!
//! The "current user" is an explicit serialized record rather than ambient
//! state: it is loaded once at startup, handed to the commands that need it,
//! and rewritten on login/register/reset. The file is replaced atomically
//! (write-temp-then-rename) so a crash mid-write never corrupts it.
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to access session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid session file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The on-disk session record: at most one logged-in user name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub current_user_name: Option<String>,
}

impl Session {
    /// Load the session record. A missing file is an empty session.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(SessionError::Io(e)),
        }
    }

    /// Record `name` as the logged-in user and persist the session
    pub fn set_user(&mut self, name: &str, path: &Path) -> Result<(), SessionError> {
        self.current_user_name = Some(name.to_string());
        self.save(path)
    }

    /// Forget the logged-in user and persist the empty session
    pub fn clear(&mut self, path: &Path) -> Result<(), SessionError> {
        self.current_user_name = None;
        self.save(path)
    }

    /// Write the record atomically: serialize to a temp file in the same
    /// directory, sync, then rename over the destination.
    fn save(&self, path: &Path) -> Result<(), SessionError> {
        let temp_path = temp_sibling(path);

        let contents = serde_json::to_vec_pretty(self)?;
        let mut temp_file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;

        let write_result = temp_file
            .write_all(&contents)
            .and_then(|_| temp_file.sync_all());
        if let Err(e) = write_result {
            let _ = std::fs::remove_file(&temp_path);
            return Err(SessionError::Io(e));
        }
        drop(temp_file);

        if let Err(e) = std::fs::rename(&temp_path, path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(SessionError::Io(e));
        }
        Ok(())
    }
}

/// Randomized temp name next to `path`, so the rename stays on one
/// filesystem and a predictable path cannot be squatted.
fn temp_sibling(path: &Path) -> PathBuf {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    path.with_extension(format!("tmp.{:016x}", nonce))
}
