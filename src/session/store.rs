//! Persisted session credential.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::paths::ensure_dir;
use crate::session::credential::SessionCredential;

/// File name of the stored session under the storage root.
pub const SESSION_FILE: &str = "auth.json";

/// Loads and saves the session credential as JSON.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store located at the default file under `root`.
    pub fn in_root(root: &Path) -> Self {
        Self::new(root.join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored credential. A missing or unreadable file yields `None`.
    pub fn load(&self) -> Result<Option<SessionCredential>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable session file {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    pub fn save(&self, credential: &SessionCredential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let content = serde_json::to_string_pretty(credential)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
