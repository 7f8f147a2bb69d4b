//! Persistent session storage.
//!
//! DESIGN
//! ======
//! The auth token and the profile snapshot are the only client-side state
//! that outlives a process. Everything that reads or writes them goes through
//! [`SessionRepository`]; in practice only `AuthState` holds one, so the
//! token has exactly one writer.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::net::types::UserSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("state file io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// What survives between runs: the bearer token and a profile snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSnapshot>,
}

pub trait SessionRepository: Send + Sync + fmt::Debug {
    /// Read the stored session. A missing store reads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the store exists but cannot be read or decoded.
    fn load(&self) -> Result<PersistedSession, StorageError>;

    /// Replace the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn save(&self, session: &PersistedSession) -> Result<(), StorageError>;

    /// Remove token and profile. Clearing an empty store is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be removed.
    fn clear(&self) -> Result<(), StorageError>;
}

// =============================================================================
// MEMORY
// =============================================================================

/// Process-local repository; nothing is written to disk.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    inner: Mutex<PersistedSession>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self { inner: Mutex::new(PersistedSession { token: Some(token.to_owned()), user: None }) }
    }
}

impl SessionRepository for MemoryRepository {
    fn load(&self) -> Result<PersistedSession, StorageError> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StorageError> {
        *self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = PersistedSession::default();
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// JSON file repository used by the CLI.
#[derive(Debug, Clone)]
pub struct FileRepository {
    path: PathBuf,
}

impl FileRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionRepository for FileRepository {
    fn load(&self) -> Result<PersistedSession, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(PersistedSession::default()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(PersistedSession::default()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, text)?;
        tracing::debug!(path = %self.path.display(), "session state saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "session state removed");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
