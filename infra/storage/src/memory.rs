use crate::contract::{MAX_IDENTIFIER_LEN, Metadata, SecureStorage, validate_identifier};
use crate::error::StorageError;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;
use zeroize::Zeroizing;

#[derive(Debug)]
struct Entry {
    data: Zeroizing<Vec<u8>>,
    metadata: Metadata,
}

/// Process-local [`SecureStorage`] backed by a hash map.
///
/// Object bytes are wiped when they are replaced or deleted, and when the last handle
/// is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<FxHashMap<String, Entry>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SecureStorage for MemoryStorage {
    async fn store(&self, id: &str, data: &[u8], metadata: Metadata) -> Result<(), StorageError> {
        validate_identifier(id, MAX_IDENTIFIER_LEN)?;
        let entry = Entry { data: Zeroizing::new(data.to_vec()), metadata };
        self.entries.write().insert(id.to_owned(), entry);
        trace!(len = data.len(), "Object stored in memory");
        Ok(())
    }

    async fn retrieve(&self, id: &str) -> Result<Vec<u8>, StorageError> {
        self.entries
            .read()
            .get(id)
            .map(|e| e.data.to_vec())
            .ok_or_else(|| StorageError::not_found(id))
    }

    async fn metadata(&self, id: &str) -> Result<Metadata, StorageError> {
        self.entries
            .read()
            .get(id)
            .map(|e| e.metadata.clone())
            .ok_or_else(|| StorageError::not_found(id))
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        self.entries.write().remove(id).map(drop).ok_or_else(|| StorageError::not_found(id))
    }

    async fn exists(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.entries.read().contains_key(id))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut ids: Vec<String> =
            self.entries.read().keys().filter(|k| k.starts_with(prefix)).cloned().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
