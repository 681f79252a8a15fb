//! # Bastion Crypto
//!
//! Key management and a pluggable cryptographic engine over
//! [`SecureStorage`](bastion_storage::SecureStorage).
//!
//! * [`keys`]: identifier rules, the [`KeyStore`](keys::KeyStore) and the
//!   [`KeyManagementService`](keys::KeyManagementService).
//! * [`provider`]: the [`CryptoEngine`](provider::CryptoEngine) contract and the native,
//!   portable and baseline providers.
//! * [`envelope`]: the symmetric and password-derived binary layouts.
//! * [`factory`]: provider selection from a
//!   [`CryptoEnvironment`](bastion_kernel::environment::CryptoEnvironment).
//!
//! Operations are identifier-in/identifier-out: inputs are read from storage, results are
//! written back and only their identifiers are returned.
//!
//! ```rust
//! use bastion_crypto::prelude::*;
//! use bastion_kernel::environment::CryptoEnvironment;
//! use bastion_logger::TracingLogger;
//! use bastion_storage::{MemoryStorage, SecureStorage};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), CryptoError> {
//! let storage = MemoryStorage::new();
//! let logger = Arc::new(TracingLogger::new());
//! let provider = ProviderFactory::create(&CryptoEnvironment::detect(), storage.clone(), logger)?;
//!
//! storage.store("report", b"quarterly numbers", Default::default()).await?;
//! let options = EncryptionOptions::default();
//! let sealed = provider.encrypt_with_password("report", "correct horse", &options).await?;
//! let opened = provider.decrypt_with_password(&sealed, "correct horse", &options).await?;
//! assert_eq!(storage.retrieve(&opened).await?, b"quarterly numbers");
//! # Ok(())
//! # }
//! ```

pub mod algorithm;
pub mod envelope;
pub mod error;
pub mod factory;
pub mod keys;
mod logging;
pub mod metadata;
pub mod options;
mod primitives;
pub mod provider;

pub use algorithm::{CipherAlgorithm, HashAlgorithm, KeyPurpose, KeyRole, SignatureAlgorithm};
pub use error::{CryptoError, CryptoErrorExt, ErrorKind};
pub use options::EncryptionOptions;
pub use primitives::digest::constant_time_eq;

pub mod prelude {
    pub use crate::algorithm::{
        CipherAlgorithm, HashAlgorithm, KeyPurpose, KeyRole, SignatureAlgorithm,
    };
    pub use crate::error::{CryptoError, CryptoErrorExt, ErrorKind};
    pub use crate::factory::ProviderFactory;
    pub use crate::keys::{KeyManagementService, KeyStore, RotatedKey};
    pub use crate::options::EncryptionOptions;
    pub use crate::provider::{
        Capabilities, CryptoEngine, CryptoProvider, KeyPairIds, ProviderConfig, ProviderKind,
    };
}
