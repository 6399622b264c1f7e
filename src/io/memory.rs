use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

use super::{ObjectStore, StoredObject};
use crate::error::StorageError;

/// In-process object store, filled up front and read concurrently
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    objects: HashMap<String, StoredObject>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, data: impl Into<Bytes>, content_type: Option<&str>) {
        self.objects.insert(
            key.into(),
            StoredObject {
                data: data.into(),
                content_type: content_type.map(str::to_string),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        Ok(self.objects.get(key).cloned())
    }
}
