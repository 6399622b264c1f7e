mod http;
mod local;
mod memory;

pub use http::HttpObjectStore;
pub use local::LocalDirStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageError;

/// A stored object and its recorded content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: Option<String>,
}

/// Trait for fetching stored artifacts by key
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the object stored under `key`, or `None` if there is none
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError>;
}

/// Storage key for an owner's file: `"{owner_id}-{filename}"`
pub fn object_key(owner_id: &str, filename: &str) -> String {
    format!("{owner_id}-{filename}")
}

/// Content type implied by a key's extension, for stores without metadata
pub fn content_type_for(key: &str) -> Option<&'static str> {
    let lower = key.to_ascii_lowercase();
    if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") || lower.ends_with(".gz") {
        Some("application/gzip")
    } else if lower.ends_with(".tar") {
        Some("application/x-tar")
    } else if lower.ends_with(".json") {
        Some("application/json")
    } else {
        None
    }
}
