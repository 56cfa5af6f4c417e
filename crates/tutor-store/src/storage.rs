//! Durable storage port
//!
//! The store reads its state once at startup and writes the persisted subset
//! after every committed mutation. Only `workspaces` and the active workspace
//! id are persisted; transient flags never reach storage.

use crate::error::StoreError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tutor_model::{Workspace, WorkspaceId};

/// Schema version written into every snapshot
pub const STATE_VERSION: u32 = 1;

/// Default state file name
pub const DEFAULT_STATE_FILE: &str = "tutor-state.json";

/// The persisted subset of store state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Schema version
    #[serde(default = "state_version")]
    pub version: u32,
    /// All workspaces, newest first
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
    /// Selected workspace, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_workspace_id: Option<WorkspaceId>,
}

fn state_version() -> u32 {
    STATE_VERSION
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            workspaces: Vec::new(),
            active_workspace_id: None,
        }
    }
}

/// Read-at-startup / write-after-mutation storage port
pub trait StateStorage: Send + Sync {
    /// Load the last snapshot, `None` when nothing was ever saved
    fn load(&self) -> Result<Option<PersistedState>, StoreError>;

    /// Replace the stored snapshot
    fn save(&self, state: &PersistedState) -> Result<(), StoreError>;
}

/// Snapshot held in memory; for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<Option<PersistedState>>,
    saves: Mutex<usize>,
}

impl MemoryStorage {
    /// Empty storage
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with a snapshot
    #[must_use]
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            inner: Mutex::new(Some(state)),
            saves: Mutex::new(0),
        }
    }

    /// Last saved snapshot
    #[must_use]
    pub fn stored(&self) -> Option<PersistedState> {
        self.inner.lock().clone()
    }

    /// Number of completed saves
    #[must_use]
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        Ok(self.inner.lock().clone())
    }

    fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        *self.inner.lock() = Some(state.clone());
        *self.saves.lock() += 1;
        Ok(())
    }
}

/// Snapshot kept in one pretty-printed JSON file
///
/// Writes go to a sibling temporary file that is renamed over the target,
/// so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Storage backed by `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_STATE_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io_error(&self.path, err)),
        };
        let state: PersistedState =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        if state.version > STATE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: state.version,
                supported: STATE_VERSION,
            });
        }
        Ok(Some(state))
    }

    fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io_error(parent, e))?;
        }
        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = self.temp_path();
        fs::write(&tmp, bytes).map_err(|e| StoreError::io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io_error(&self.path, e))?;
        Ok(())
    }
}
