//! Sandboxed file backend.
//!
//! Every object becomes one record file under a sharded directory tree rooted at a
//! canonicalized path. Short identifiers are hex-named; longer ones are named by SHA-256
//! digest and recovered from the record header when listing.
//!
//! Writes follow the atomic swap pattern (unique temp file, `fsync`, `rename`, directory
//! sync), so an interrupted write leaves the previous object intact plus at most one temp
//! file, which the next [`FileStorageBuilder::connect`] removes.

use crate::builder::FileStorageBuilder;
use crate::contract::{MAX_IDENTIFIER_LEN, Metadata, SecureStorage, validate_identifier};
use crate::error::{StorageError, StorageErrorExt};
use crate::maintenance::{self, TMP_MARKER};
use crate::security::BlobName;
use crate::{record, security};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use zeroize::Zeroizing;

#[derive(Debug)]
pub struct FileStorageInner {
    /// Canonical physical root; every resolved path must stay below it.
    pub(crate) root: PathBuf,
    pub(crate) tmp_counter: AtomicU64,
}

/// Durable [`SecureStorage`] over a local directory.
///
/// The handle is reference-counted and cheap to clone.
///
/// ```rust
/// use bastion_storage::{FileStorage, Metadata, SecureStorage, StorageError};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), StorageError> {
///     # let tmp = tempfile::tempdir().unwrap();
///     let storage = FileStorage::builder().root(tmp.path().join("vault")).connect().await?;
///
///     storage.store("keys/primary", b"secret", Metadata::new()).await?;
///     assert_eq!(storage.retrieve("keys/primary").await?, b"secret");
///     assert_eq!(storage.list("keys/").await?, vec!["keys/primary".to_owned()]);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    pub(crate) inner: Arc<FileStorageInner>,
}

impl Deref for FileStorage {
    type Target = FileStorageInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FileStorage {
    #[must_use = "The storage engine is not initialized until you call .connect()"]
    pub fn builder() -> FileStorageBuilder {
        FileStorageBuilder::new()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Physical path of the record holding `id`.
    pub fn resolve(&self, id: &str) -> Result<PathBuf, StorageError> {
        validate_identifier(id, MAX_IDENTIFIER_LEN)?;
        security::object_path(&self.root, id)
    }

    pub async fn purge_tmp(&self) {
        maintenance::purge_tmp(&self.root).await;
    }

    async fn read_record(&self, id: &str) -> Result<Zeroizing<Vec<u8>>, StorageError> {
        let resolved = self.resolve(id)?;
        match fs::read(&resolved).await {
            Ok(data) => Ok(Zeroizing::new(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(id))
            },
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Read failed: {}", resolved.display()).into()),
            }),
        }
    }

    async fn write_record(&self, resolved: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create shards for {}", resolved.display()))?;
        }

        let temp = unique_tmp_path(resolved, &self.tmp_counter);

        {
            let mut file = fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&temp)
                .await
                .context(format!("Temp creation failed: {}", temp.display()))?;
            file.write_all(bytes).await.context("Write failed")?;
            file.sync_all().await.context("Hardware sync failed")?;
        }

        if let Err(err) = fs::rename(&temp, resolved).await {
            let _ = fs::remove_file(&temp).await;
            return Err(StorageError::Io {
                source: err,
                context: Some(
                    format!("Atomic swap failed: {} -> {}", temp.display(), resolved.display())
                        .into(),
                ),
            });
        }

        if let Some(parent) = resolved.parent() {
            sync_dir(parent).await;
        }
        Ok(())
    }

    fn list_blocking(root: &Path, prefix: &str) -> Vec<String> {
        let mut ids: Vec<String> = walkdir::WalkDir::new(root)
            .into_iter()
            .flatten()
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| match security::blob_name(e.path())? {
                BlobName::Encoded(id) => Some(id),
                BlobName::Digest => match record::read_header(e.path()) {
                    Ok(header) => Some(header.id),
                    Err(err) => {
                        let path = e.path().display();
                        tracing::warn!(path = %path, error = %err, "Unreadable record header");
                        None
                    },
                },
            })
            .filter(|id| id.starts_with(prefix))
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl SecureStorage for FileStorage {
    async fn store(&self, id: &str, data: &[u8], metadata: Metadata) -> Result<(), StorageError> {
        let resolved = self.resolve(id)?;
        let bytes = Zeroizing::new(record::encode(id, data, &metadata)?);
        self.write_record(&resolved, &bytes).await?;
        debug!(path = %resolved.display(), len = data.len(), "Record saved atomically");
        Ok(())
    }

    async fn retrieve(&self, id: &str) -> Result<Vec<u8>, StorageError> {
        let raw = self.read_record(id).await?;
        let (_, data) = decode_for(id, &raw)?;
        Ok(data.to_vec())
    }

    async fn metadata(&self, id: &str) -> Result<Metadata, StorageError> {
        let raw = self.read_record(id).await?;
        let (header, _) = decode_for(id, &raw)?;
        Ok(header.metadata)
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let resolved = self.resolve(id)?;
        match fs::remove_file(&resolved).await {
            Ok(()) => {},
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::not_found(id));
            },
            Err(err) => {
                return Err(StorageError::Io {
                    source: err,
                    context: Some(format!("Failed to delete: {}", resolved.display()).into()),
                });
            },
        }
        if let Some(parent) = resolved.parent() {
            sync_dir(parent).await;
        }
        debug!(path = %resolved.display(), "Record deleted");
        Ok(())
    }

    async fn exists(&self, id: &str) -> Result<bool, StorageError> {
        let resolved = self.resolve(id)?;
        fs::try_exists(&resolved).await.context("Existence check failed")
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let root = self.root.clone();
        let prefix = prefix.to_owned();
        tokio::task::spawn_blocking(move || Self::list_blocking(&root, &prefix)).await.map_err(|e| {
            StorageError::Internal {
                message: e.to_string().into(),
                context: Some("Listing task failed".into()),
            }
        })
    }
}

/// Decodes a record and checks it was written for `id`.
fn decode_for<'a>(id: &str, raw: &'a [u8]) -> Result<(record::Header, &'a [u8]), StorageError> {
    let (header, data) = record::decode(raw)?;
    if header.id != id {
        return Err(StorageError::Corrupted {
            message: "record belongs to another identifier".into(),
            context: Some(id.to_owned().into()),
        });
    }
    Ok((header, data))
}

async fn sync_dir(path: &Path) {
    match fs::File::open(path).await {
        Ok(dir) => {
            if let Err(err) = dir.sync_all().await {
                tracing::warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Directory open failed");
        },
    }
}

fn unique_tmp_path(target: &Path, counter: &AtomicU64) -> PathBuf {
    let counter = counter.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("record");
    target.with_file_name(format!("{file_name}{TMP_MARKER}{}.{counter}", std::process::id()))
}
