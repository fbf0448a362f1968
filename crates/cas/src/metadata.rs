//! Metadata types for stored objects.
//!
//! Each object carries a small JSON sidecar so the declared content type can be
//! served back without inspecting the bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::Fingerprint;

/// Metadata persisted alongside an object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Content type declared by the uploader (e.g., "image/png").
    ///
    /// `None` for objects written without one; readers decide the fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Size of the content in bytes.
    pub size: u64,

    /// When the object was first written.
    pub uploaded: DateTime<Utc>,
}

impl ObjectMetadata {
    pub fn new(content_type: Option<String>, size: u64) -> Self {
        Self {
            content_type,
            size,
            uploaded: Utc::now(),
        }
    }
}

/// Confirmation returned by a successful `put`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutReceipt {
    pub key: Fingerprint,
    pub size: u64,
    pub uploaded: DateTime<Utc>,
    /// False when identical content was already present and nothing was written.
    pub created: bool,
}

/// An object read back from the store.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content: Vec<u8>,
    pub metadata: Option<ObjectMetadata>,
}

impl StoredObject {
    /// The stored content type, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.content_type.as_deref())
    }
}
