//! Persisted session token.
//!
//! The file holds a single JSON object `{ "token": "..." }`. It is read on
//! every request so a login or logout from another process takes effect
//! without restarting the client.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current token, or `None` when no session is stored.
    ///
    /// A file that exists but does not parse is treated as no session and
    /// left in place for inspection.
    pub fn load(&self) -> Result<Option<String>, ApiError> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(storage_error("read", &self.path, &err)),
        };

        match serde_json::from_slice::<StoredToken>(&contents) {
            Ok(stored) if !stored.token.trim().is_empty() => Ok(Some(stored.token)),
            Ok(_) => Ok(None),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Ignoring unreadable session token file"
                );
                Ok(None)
            }
        }
    }

    pub fn save(&self, token: &str) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| storage_error("create", parent, &err))?;
        }

        let body = serde_json::to_vec(&StoredToken {
            token: token.to_string(),
        })
        .map_err(|err| ApiError::Storage(err.to_string()))?;
        fs::write(&self.path, body).map_err(|err| storage_error("write", &self.path, &err))?;
        debug!(path = %self.path.display(), "Session token saved");
        Ok(())
    }

    /// Remove the stored token. Clearing an absent token succeeds.
    pub fn clear(&self) -> Result<(), ApiError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session token cleared");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_error("remove", &self.path, &err)),
        }
    }
}

fn storage_error(op: &str, path: &Path, err: &std::io::Error) -> ApiError {
    ApiError::Storage(format!("failed to {op} {}: {err}", path.display()))
}
