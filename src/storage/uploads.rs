//! Uploaded roster files.
//!
//! Uploads are stored under a content-hash name so repeated uploads of the
//! same roster share one file. Files older than the retention window are
//! purged after each report.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::StorageError;
use crate::roster::is_archive;

/// Roster upload directory with time-based retention.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    retention: Duration,
}

impl UploadStore {
    pub fn new(dir: PathBuf, retention: Duration) -> Self {
        Self { dir, retention }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store roster bytes and return the stored path.
    pub fn save(&self, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(Self::file_name(bytes));
        if !path.exists() {
            std::fs::write(&path, bytes)?;
            debug!(path = %path.display(), bytes = bytes.len(), "Stored upload");
        }
        Ok(path)
    }

    /// Content-hash file name; archives keep the `.rosz` extension.
    fn file_name(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash = hex::encode(&hasher.finalize()[..8]);
        let extension = if is_archive(bytes) { "rosz" } else { "ros" };
        format!("{hash}.{extension}")
    }

    /// Delete roster files older than the retention window.
    pub fn purge_expired(&self) -> Result<usize, StorageError> {
        self.purge_older_than(self.retention)
    }

    /// Delete roster files whose modification time is at least `max_age` ago.
    pub fn purge_older_than(&self, max_age: Duration) -> Result<usize, StorageError> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let now = SystemTime::now();
        let mut deleted = 0;
        for extension in ["ros", "rosz"] {
            let pattern = self.dir.join(format!("*.{extension}"));
            for entry in glob::glob(&pattern.to_string_lossy())? {
                let path = match entry {
                    Ok(path) => path,
                    Err(e) => {
                        warn!(error = %e, "Unreadable upload entry");
                        continue;
                    }
                };
                let age = std::fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .unwrap_or_default();
                if age >= max_age {
                    match std::fs::remove_file(&path) {
                        Ok(()) => deleted += 1,
                        Err(e) => warn!(path = %path.display(), error = %e, "Failed to purge upload"),
                    }
                }
            }
        }
        if deleted > 0 {
            debug!(deleted, "Purged expired uploads");
        }
        Ok(deleted)
    }
}
