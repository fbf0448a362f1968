//! FileStore: filesystem-backed object storage with directory sharding.
//!
//! Layout:
//! ```text
//! {base_path}/
//! ├── objects/
//! │   ├── ab/
//! │   │   └── cde123...       # Content file (remainder of fingerprint)
//! │   └── 12/
//! │       └── 3456789...
//! └── metadata/
//!     ├── ab/
//!     │   └── cde123....json  # {content_type, size, uploaded}
//!     └── 12/
//!         └── 3456789....json
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::CasConfig;
use crate::hash::Fingerprint;
use crate::metadata::{ObjectMetadata, PutReceipt, StoredObject};

/// Key/blob storage consumed by the HTTP layer.
///
/// Implementations must tolerate concurrent writes of the same key; since keys
/// are content-derived those writes always carry identical bytes.
pub trait ObjectStore: Send + Sync {
    /// Store `content` under `key` with an optional declared content type.
    ///
    /// Returns `Ok(None)` when the store declines the write without failing
    /// (for example when opened read-only). Writing a key that already exists
    /// succeeds and leaves the original object in place.
    fn put(
        &self,
        key: &Fingerprint,
        content: &[u8],
        content_type: Option<&str>,
    ) -> Result<Option<PutReceipt>>;

    /// Look up an object by key.
    ///
    /// Keys are case-sensitive. Returns `Ok(None)` if nothing is stored under
    /// `key`, including keys that are not lowercase 40-char fingerprints.
    fn get(&self, key: &str) -> Result<Option<StoredObject>>;
}

/// Filesystem-based object store.
#[derive(Debug, Clone)]
pub struct FileStore {
    config: CasConfig,
}

impl FileStore {
    /// Create a new FileStore with the given configuration.
    ///
    /// Creates the objects and metadata directories if they don't exist
    /// (unless in read-only mode).
    pub fn new(config: CasConfig) -> Result<Self> {
        if !config.read_only {
            fs::create_dir_all(config.objects_dir())
                .context("failed to create objects directory")?;
            fs::create_dir_all(config.metadata_dir())
                .context("failed to create metadata directory")?;
        }

        Ok(Self { config })
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(CasConfig::with_base_path(path))
    }

    pub fn read_only_at(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(CasConfig::read_only(path))
    }

    pub fn config(&self) -> &CasConfig {
        &self.config
    }

    fn object_path(&self, key: &Fingerprint) -> PathBuf {
        self.config
            .objects_dir()
            .join(key.prefix())
            .join(key.remainder())
    }

    fn metadata_path(&self, key: &Fingerprint) -> PathBuf {
        self.config
            .metadata_dir()
            .join(key.prefix())
            .join(format!("{}.json", key.remainder()))
    }

    fn read_metadata(&self, key: &Fingerprint) -> Result<Option<ObjectMetadata>> {
        let path = self.metadata_path(key);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("failed to read metadata file"),
        };

        match serde_json::from_str(&json) {
            Ok(meta) => Ok(Some(meta)),
            Err(e) => {
                warn!(key = %key, "ignoring unparsable metadata: {}", e);
                Ok(None)
            }
        }
    }
}

/// Write `data` to `path` via a uniquely named sibling and a rename, so readers
/// never observe a partially written file.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .context("object path has no parent directory")?;
    fs::create_dir_all(parent).context("failed to create prefix directory")?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("object path has no file name")?;
    let tmp = parent.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    fs::write(&tmp, data).context("failed to write temporary file")?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).context("failed to move temporary file into place");
    }
    Ok(())
}

impl ObjectStore for FileStore {
    fn put(
        &self,
        key: &Fingerprint,
        content: &[u8],
        content_type: Option<&str>,
    ) -> Result<Option<PutReceipt>> {
        if self.config.read_only {
            debug!(key = %key, "store is read-only, declining write");
            return Ok(None);
        }

        let obj_path = self.object_path(key);
        let meta_path = self.metadata_path(key);

        // Sidecar before object: a visible object always has its metadata.
        let metadata = match self.read_metadata(key)? {
            Some(existing) if obj_path.exists() => {
                return Ok(Some(PutReceipt {
                    key: key.clone(),
                    size: existing.size,
                    uploaded: existing.uploaded,
                    created: false,
                }));
            }
            Some(existing) => existing,
            None => {
                let meta =
                    ObjectMetadata::new(content_type.map(str::to_string), content.len() as u64);
                let json = serde_json::to_vec(&meta).context("failed to serialize metadata")?;
                write_atomic(&meta_path, &json)?;
                meta
            }
        };

        let created = !obj_path.exists();
        if created {
            write_atomic(&obj_path, content)?;
        }

        Ok(Some(PutReceipt {
            key: key.clone(),
            size: content.len() as u64,
            uploaded: metadata.uploaded,
            created,
        }))
    }

    fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        let key = match Fingerprint::from_str_checked(key) {
            Ok(k) => k,
            Err(e) => {
                debug!(key, "not a fingerprint: {}", e);
                return Ok(None);
            }
        };

        let content = match fs::read(self.object_path(&key)) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("failed to read object file"),
        };

        let metadata = self.read_metadata(&key)?;
        Ok(Some(StoredObject { content, metadata }))
    }
}
