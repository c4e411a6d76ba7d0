//! Filesystem storage.
//!
//! Handles the local data directory:
//! - Cached reference tables and their fetch manifest
//! - Uploaded roster files awaiting purge

pub mod dataset;
pub mod uploads;

pub use dataset::{DatasetStore, Manifest, RefreshPolicy, RefreshReport};
pub use uploads::UploadStore;

use std::path::PathBuf;
use thiserror::Error;

use crate::fetch::FetchError;
use crate::reference::ReferenceError;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("{file} is unavailable and no cached copy exists: {source}")]
    Unavailable {
        file: String,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        let uploads_dir = data_dir.join("uploads");
        Self {
            data_dir,
            uploads_dir,
        }
    }

    /// Builder method to place uploads elsewhere.
    pub fn with_uploads_dir(mut self, uploads_dir: PathBuf) -> Self {
        self.uploads_dir = uploads_dir;
        self
    }

    /// Cached reference tables.
    pub fn dataset_dir(&self) -> PathBuf {
        self.data_dir.join("wahapedia")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
