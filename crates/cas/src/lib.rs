//! Content addressed object storage for imghoard.
//!
//! Objects are keyed by the SHA-1 [`Fingerprint`] of their bytes, so storing
//! the same content twice lands on the same key and writes nothing new.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cas::{Fingerprint, FileStore, ObjectStore};
//!
//! let store = FileStore::at_path("/srv/imghoard/store").unwrap();
//!
//! let bytes = std::fs::read("cat.png").unwrap();
//! let key = Fingerprint::from_data(&bytes);
//! if let Some(receipt) = store.put(&key, &bytes, Some("image/png")).unwrap() {
//!     println!("Stored as: {} at {}", receipt.key, receipt.uploaded);
//! }
//!
//! if let Some(object) = store.get(key.as_str()).unwrap() {
//!     println!("Got {} bytes of {:?}", object.content.len(), object.content_type());
//! }
//! ```
//!
//! Two backends ship here: [`FileStore`] (sharded directories with JSON
//! sidecars, safe on shared filesystems) and [`MemoryStore`].

pub mod config;
pub mod hash;
pub mod memory;
pub mod metadata;
pub mod store;

pub use config::CasConfig;
pub use hash::{Fingerprint, HashError, FINGERPRINT_LEN};
pub use memory::MemoryStore;
pub use metadata::{ObjectMetadata, PutReceipt, StoredObject};
pub use store::{FileStore, ObjectStore};
