//! Error types for the workspace store
//!
//! Only the storage port can fail. Store mutations themselves never fail:
//! unknown ids are no-ops, and a failed save is logged rather than undoing
//! the committed in-memory state.

use std::path::PathBuf;

/// Durable storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error reading or writing the state file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// State file is not valid JSON for the persisted schema
    #[error("corrupt state in {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot could not be encoded
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),

    /// Persisted schema version is newer than this build understands
    #[error("unsupported state version {found} (max {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_mentions_path() {
        let err = StoreError::io_error(
            "/tmp/state.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/state.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn version_error_display() {
        let err = StoreError::UnsupportedVersion {
            found: 9,
            supported: 1,
        };
        assert_eq!(err.to_string(), "unsupported state version 9 (max 1)");
    }
}
