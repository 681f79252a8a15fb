use crate::engine::{FileStorage, FileStorageInner};
use crate::error::{StorageError, StorageErrorExt};
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::fs;
use tracing::info;

#[derive(Debug, Clone)]
struct FileStorageConfig {
    create: bool,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self { create: true }
    }
}

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct FileStorageBuilder<S: Sealed = NoRoot> {
    state: S,
    config: FileStorageConfig,
}

#[allow(private_bounds)]
impl<S: Sealed> FileStorageBuilder<S> {
    /// Whether a missing root directory is created on connect (default `true`).
    #[must_use = "Sets whether the storage root should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.config.create = enable;
        self
    }

    fn transition<N: Sealed>(self, state: N) -> FileStorageBuilder<N> {
        FileStorageBuilder { state, config: self.config }
    }
}

impl FileStorageBuilder<NoRoot> {
    #[must_use = "Creates a new storage builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the root directory path for the storage engine"]
    pub fn root(self, path: impl Into<PathBuf>) -> FileStorageBuilder<WithRoot> {
        self.transition(WithRoot(path.into()))
    }
}

impl FileStorageBuilder<WithRoot> {
    /// Bootstraps and canonicalizes the root, purges stale temp files and returns the handle.
    ///
    /// Cleanup failures are logged, never returned.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the root is missing with `create(false)`, or cannot be
    /// created or resolved.
    pub async fn connect(self) -> Result<FileStorage, StorageError> {
        let root = &self.state.0;

        if self.config.create {
            fs::create_dir_all(root)
                .await
                .context(format!("Failed to bootstrap storage root: {}", root.display()))?;
        }

        let canonical = fs::canonicalize(root)
            .await
            .context(format!("Failed to resolve storage root: {}", root.display()))?;
        info!(path = %canonical.display(), "File storage connected");

        let storage = FileStorage {
            inner: Arc::new(FileStorageInner { root: canonical, tmp_counter: AtomicU64::new(1) }),
        };

        storage.purge_tmp().await;

        Ok(storage)
    }
}
