//! Object store configuration.
//!
//! There is no default location here; the server resolves one from its
//! config (`paths.store_dir`) and hands it over.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the filesystem object store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasConfig {
    /// Base path for storage.
    /// Objects live in `{base_path}/objects/`, metadata in `{base_path}/metadata/`.
    pub base_path: PathBuf,

    /// Read-only mode - `put` declines every write.
    #[serde(default)]
    pub read_only: bool,
}

impl CasConfig {
    pub fn with_base_path(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
            read_only: false,
        }
    }

    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
            read_only: true,
        }
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.base_path.join("objects")
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.base_path.join("metadata")
    }
}
