use crate::error::StorageError;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

/// String metadata persisted next to each object.
pub type Metadata = BTreeMap<String, String>;

/// Upper bound on identifier length accepted by any backend.
pub const MAX_IDENTIFIER_LEN: usize = 1024;

/// Asynchronous object store that every key, ciphertext and signature passes through.
///
/// Writes are single atomic puts of data and metadata together: a reader sees either the
/// previous object or the new one, never a mix. Implementations are cheap handles
/// (`Arc` inside) so callers clone them freely.
pub trait SecureStorage: Send + Sync + 'static {
    /// Creates or replaces the object stored under `id`.
    fn store(
        &self,
        id: &str,
        data: &[u8],
        metadata: Metadata,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Returns the object bytes, or [`StorageError::NotFound`].
    fn retrieve(&self, id: &str) -> impl Future<Output = Result<Vec<u8>, StorageError>> + Send;

    /// Returns the metadata stored with the object, or [`StorageError::NotFound`].
    fn metadata(&self, id: &str) -> impl Future<Output = Result<Metadata, StorageError>> + Send;

    /// Removes the object, or fails with [`StorageError::NotFound`].
    fn delete(&self, id: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn exists(&self, id: &str) -> impl Future<Output = Result<bool, StorageError>> + Send;

    /// Identifiers starting with `prefix`, sorted.
    fn list(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;
}

impl<S: SecureStorage> SecureStorage for Arc<S> {
    fn store(
        &self,
        id: &str,
        data: &[u8],
        metadata: Metadata,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).store(id, data, metadata)
    }

    fn retrieve(&self, id: &str) -> impl Future<Output = Result<Vec<u8>, StorageError>> + Send {
        (**self).retrieve(id)
    }

    fn metadata(&self, id: &str) -> impl Future<Output = Result<Metadata, StorageError>> + Send {
        (**self).metadata(id)
    }

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).delete(id)
    }

    fn exists(&self, id: &str) -> impl Future<Output = Result<bool, StorageError>> + Send {
        (**self).exists(id)
    }

    fn list(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send {
        (**self).list(prefix)
    }
}

/// Checks the backend-independent identifier rules.
///
/// # Errors
/// [`StorageError::InvalidIdentifier`] for empty identifiers, identifiers longer than
/// `max_len` bytes or identifiers containing control characters.
pub fn validate_identifier(id: &str, max_len: usize) -> Result<(), StorageError> {
    let reason = if id.is_empty() {
        "identifier is empty"
    } else if id.len() > max_len {
        "identifier is too long"
    } else if id.chars().any(char::is_control) {
        "identifier contains control characters"
    } else {
        return Ok(());
    };

    Err(StorageError::InvalidIdentifier { message: reason.into(), context: None })
}
