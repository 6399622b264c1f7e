//! Artifact pipeline: storage fetch, decompression and entry lookup.
//!
//! Each call works on its own request-scoped buffers. Entry bytes are
//! returned as [`Bytes`] views into the decompressed container, so nothing
//! is copied after decompression and nothing outlives the call unless the
//! caller keeps it.

use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info};

use crate::decompress::{decompress, is_compressed};
use crate::error::{ArtifactError, StorageError};
use crate::io::{ObjectStore, StoredObject};
use crate::tar::{Extracted, TarExtractor};

/// Outcome of looking up one entry inside a stored artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryLookup {
    /// No object under the storage key
    ObjectNotFound,
    /// The object exists but holds no matching entry
    EntryNotFound,
    /// Entry content; `truncated` is set when the container was clipped
    Found { data: Bytes, truncated: bool },
}

/// Composes the storage collaborator with the decompressor and extractor
pub struct ArtifactService {
    store: Arc<dyn ObjectStore>,
}

impl ArtifactService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Fetch the raw stored object
    pub async fn fetch(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let object = self.store.get(key).await?;
        debug!(key = %key, found = object.is_some(), "fetched object");
        Ok(object)
    }

    /// Fetch an object and return its container, decompressing if needed
    pub async fn open(&self, key: &str) -> Result<Option<Bytes>, ArtifactError> {
        let Some(object) = self.fetch(key).await? else {
            return Ok(None);
        };
        Ok(Some(open_container(object.data).await?))
    }

    /// Names of every entry in the stored container
    pub async fn entry_names(&self, key: &str) -> Result<Option<Vec<String>>, ArtifactError> {
        let Some(container) = self.open(key).await? else {
            return Ok(None);
        };
        Ok(Some(TarExtractor::new(&container).list_names()))
    }

    /// Extract one entry from the stored container
    pub async fn read_entry(&self, key: &str, entry: &str) -> Result<EntryLookup, ArtifactError> {
        let Some(container) = self.open(key).await? else {
            return Ok(EntryLookup::ObjectNotFound);
        };

        let lookup = match TarExtractor::new(&container).extract(entry) {
            None => EntryLookup::EntryNotFound,
            Some(Extracted::Complete(data)) => EntryLookup::Found {
                data: container.slice_ref(data),
                truncated: false,
            },
            Some(Extracted::Truncated { data, .. }) => EntryLookup::Found {
                data: container.slice_ref(data),
                truncated: true,
            },
        };

        info!(key = %key, entry = %entry, found = matches!(lookup, EntryLookup::Found { .. }), "entry lookup");
        Ok(lookup)
    }
}

/// Decompress `data` when it is gzip, otherwise treat it as a plain container
pub async fn open_container(data: Bytes) -> Result<Bytes, ArtifactError> {
    if is_compressed(&data) {
        Ok(decompress(data).await?.into())
    } else {
        Ok(data)
    }
}
