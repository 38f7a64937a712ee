//! Persisted "last synced commit" marker.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::IoError;
use crate::model::is_blank;

pub trait SyncMarker {
    /// The last synced commit id, or `None` when nothing was synced yet.
    fn read_last_synced_commit(&self) -> Result<Option<String>, IoError>;

    /// Stores `commit`. Blank ids are ignored.
    fn write_last_synced_commit(&self, commit: &str) -> Result<(), IoError>;
}

/// Marker kept as a single-line text file.
#[derive(Debug, Clone)]
pub struct FileSyncMarker {
    path: PathBuf,
}

impl FileSyncMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SyncMarker for FileSyncMarker {
    fn read_last_synced_commit(&self) -> Result<Option<String>, IoError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let commit = content.trim();
                Ok((!commit.is_empty()).then(|| commit.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no sync marker found");
                Ok(None)
            }
            Err(e) => Err(IoError::read_error(&self.path, e)),
        }
    }

    fn write_last_synced_commit(&self, commit: &str) -> Result<(), IoError> {
        if is_blank(commit) {
            return Ok(());
        }
        fs::write(&self.path, commit.trim()).map_err(|e| IoError::write_error(&self.path, e))?;
        info!(path = %self.path.display(), commit = commit.trim(), "recorded synced commit");
        Ok(())
    }
}
