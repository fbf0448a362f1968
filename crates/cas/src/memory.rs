//! MemoryStore: an in-process object store.
//!
//! Used by tests and for throwaway instances (`--memory`). Nothing survives a
//! restart.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};

use crate::hash::Fingerprint;
use crate::metadata::{ObjectMetadata, PutReceipt, StoredObject};
use crate::store::ObjectStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, (Vec<u8>, ObjectMetadata)>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that declines every write.
    pub fn read_only() -> Self {
        Self {
            objects: RwLock::default(),
            read_only: true,
        }
    }

    /// Insert an object with explicit metadata, bypassing `put`.
    ///
    /// Lets tests plant objects that were stored without a content type.
    pub fn insert_raw(&self, key: &str, content: Vec<u8>, metadata: ObjectMetadata) -> Result<()> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        objects.insert(key.to_string(), (content, metadata));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryStore {
    fn put(
        &self,
        key: &Fingerprint,
        content: &[u8],
        content_type: Option<&str>,
    ) -> Result<Option<PutReceipt>> {
        if self.read_only {
            return Ok(None);
        }

        let mut objects = self
            .objects
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;

        if let Some((_, existing)) = objects.get(key.as_str()) {
            return Ok(Some(PutReceipt {
                key: key.clone(),
                size: existing.size,
                uploaded: existing.uploaded,
                created: false,
            }));
        }

        let metadata = ObjectMetadata::new(content_type.map(str::to_string), content.len() as u64);
        let receipt = PutReceipt {
            key: key.clone(),
            size: metadata.size,
            uploaded: metadata.uploaded,
            created: true,
        };
        objects.insert(key.as_str().to_string(), (content.to_vec(), metadata));
        Ok(Some(receipt))
    }

    fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        if Fingerprint::from_str_checked(key).is_err() {
            return Ok(None);
        }
        let objects = self
            .objects
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;

        Ok(objects.get(key).map(|(content, metadata)| StoredObject {
            content: content.clone(),
            metadata: Some(metadata.clone()),
        }))
    }
}
