//! Facade crate for the Bastion crypto core.
//! Composes storage, key management and the selected crypto provider behind one handle.
//! Keep this crate thin: it wires the other crates together and implements no cryptography.
//!
//! ## Usage
//! ```rust
//! use bastion::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), BastionError> {
//! let services = CryptoServices::in_memory(CryptoEnvironment::detect())?;
//! let provider = services.provider();
//! let options = EncryptionOptions::default();
//!
//! provider.generate_key(32, "orders", KeyPurpose::Encryption, &options).await?;
//! let rotated = services.kms().rotate_key("orders", None).await?;
//! assert_eq!(rotated.key.len(), 32);
//! # Ok(())
//! # }
//! ```

use bastion_crypto::keys::{KeyManagementService, KeyStore};
use bastion_crypto::provider::{CryptoEngine, CryptoProvider};
use bastion_crypto::{CryptoError, factory::ProviderFactory};
use bastion_kernel::config::ConfigError;
use bastion_kernel::environment::{
    CryptoEnvironment, DeploymentType, PARAM_LOG_DIR, PARAM_REVEAL_PRIVATE_LOGS,
};
use bastion_logger::{LevelFilter, Logger, LoggerError, SecureLogger, TracingLogger};
use bastion_storage::{FileStorage, MemoryStorage, SecureStorage, StorageError};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub use bastion_crypto as crypto;
pub use bastion_kernel as kernel;
pub use bastion_logger as logger;
pub use bastion_storage as storage;

/// Failures while assembling [`CryptoServices`].
#[bastion_derive::bastion_error]
pub enum BastionError {
    #[error("Crypto error{}: {source}", format_context(.context))]
    Crypto { source: CryptoError, context: Option<Cow<'static, str>> },

    #[error("Storage error{}: {source}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    #[error("Configuration error{}: {source}", format_context(.context))]
    Config { source: ConfigError, context: Option<Cow<'static, str>> },

    #[error("Logging error{}: {source}", format_context(.context))]
    Logging { source: LoggerError, context: Option<Cow<'static, str>> },
}

/// One storage backend shared by the key management service and the crypto provider.
///
/// Both halves see the same [`KeyStore`], so keys rotated through [`Self::kms`] are
/// immediately used by [`Self::provider`].
#[derive(Debug)]
pub struct CryptoServices<S> {
    environment: CryptoEnvironment,
    keys: KeyStore<S>,
    kms: KeyManagementService<S>,
    provider: CryptoProvider<S>,
}

impl<S: Clone> Clone for CryptoServices<S> {
    fn clone(&self) -> Self {
        Self {
            environment: self.environment.clone(),
            keys: self.keys.clone(),
            kms: self.kms.clone(),
            provider: self.provider.clone(),
        }
    }
}

impl<S: SecureStorage + Clone> CryptoServices<S> {
    /// Assembles the services over `storage` with the provider chosen by [`ProviderFactory`].
    ///
    /// # Errors
    /// [`BastionError::Crypto`] when the environment names an unknown provider or carries
    /// malformed parameters.
    pub fn with_storage(
        environment: CryptoEnvironment,
        storage: S,
        logger: Arc<dyn SecureLogger>,
    ) -> Result<Self, BastionError> {
        let keys = KeyStore::new(storage);
        let provider =
            ProviderFactory::create_with_key_store(&environment, keys.clone(), Arc::clone(&logger))
                .context("Selecting crypto provider")?;
        let kms = KeyManagementService::new(keys.clone(), logger)
            .with_cipher(provider.capabilities().default_cipher);

        info!(
            deployment = %environment.kind(),
            provider = %provider.kind(),
            "Crypto services ready"
        );
        Ok(Self { environment, keys, kms, provider })
    }

    pub const fn environment(&self) -> &CryptoEnvironment {
        &self.environment
    }

    pub const fn key_store(&self) -> &KeyStore<S> {
        &self.keys
    }

    pub const fn kms(&self) -> &KeyManagementService<S> {
        &self.kms
    }

    pub const fn provider(&self) -> &CryptoProvider<S> {
        &self.provider
    }
}

impl CryptoServices<MemoryStorage> {
    /// Volatile services for tests and short-lived tools.
    ///
    /// # Errors
    /// See [`Self::with_storage`].
    pub fn in_memory(environment: CryptoEnvironment) -> Result<Self, BastionError> {
        let logger = Arc::new(secure_logger(&environment));
        Self::with_storage(environment, MemoryStorage::new(), logger)
    }
}

impl CryptoServices<FileStorage> {
    /// Services persisted under `root`, which is created when missing.
    ///
    /// # Errors
    /// [`BastionError::Storage`] when the root cannot be prepared, otherwise see
    /// [`Self::with_storage`].
    pub async fn open(
        environment: CryptoEnvironment,
        root: impl Into<PathBuf>,
    ) -> Result<Self, BastionError> {
        let storage =
            FileStorage::builder().root(root).connect().await.context("Opening key storage")?;
        let logger = Arc::new(secure_logger(&environment));
        Self::with_storage(environment, storage, logger)
    }
}

/// Reads a [`CryptoEnvironment`] from `path` overlaid with `BASTION__*` variables.
///
/// # Errors
/// [`BastionError::Config`] for a missing file or malformed values.
pub fn load_environment(path: Option<&Path>) -> Result<CryptoEnvironment, BastionError> {
    Ok(bastion_kernel::config::load_config(path)?)
}

/// Installs the process-wide subscriber for `environment`.
///
/// Development logs at `DEBUG`, other deployments at `INFO`. With `log_dir` set, logs also
/// roll into files named after `name`, as JSON lines in production. Keep the returned
/// [`Logger`] alive until shutdown.
///
/// # Errors
/// [`BastionError::Logging`] when the log directory is unusable or a subscriber is
/// already installed.
pub fn init_logging(environment: &CryptoEnvironment, name: &str) -> Result<Logger, BastionError> {
    let builder = Logger::builder().name(name).level(log_level(environment.kind()));
    let logger = match environment.parameter(PARAM_LOG_DIR) {
        Some(dir) if environment.kind() == DeploymentType::Production => {
            builder.path(dir).json().init()
        },
        Some(dir) => builder.path(dir).init(),
        None => builder.init(),
    };
    Ok(logger.context("Installing log subscriber")?)
}

const fn log_level(kind: DeploymentType) -> LevelFilter {
    match kind {
        DeploymentType::Development => LevelFilter::DEBUG,
        DeploymentType::Staging | DeploymentType::Production => LevelFilter::INFO,
    }
}

/// `Private` log values are rendered only in development with `reveal_private_logs=true`.
fn reveals_private(environment: &CryptoEnvironment) -> bool {
    environment.kind() == DeploymentType::Development
        && environment
            .parameter(PARAM_REVEAL_PRIVATE_LOGS)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn secure_logger(environment: &CryptoEnvironment) -> TracingLogger {
    TracingLogger::new().reveal_private(reveals_private(environment))
}

pub mod prelude {
    pub use crate::{BastionError, BastionErrorExt, CryptoServices, init_logging, load_environment};
    pub use bastion_crypto::prelude::*;
    pub use bastion_kernel::environment::{CryptoEnvironment, DeploymentType};
    pub use bastion_logger::{SecureLogger, TracingLogger};
    pub use bastion_storage::{FileStorage, MemoryStorage, SecureStorage};
}
