//! # Crypto Providers
//!
//! One engine implementation, [`CryptoProvider`], parameterised by a per-kind capability
//! table. The [`CryptoEngine`] trait is the operation set callers program against; it is
//! identifier-in/identifier-out, so secrets stay in [`SecureStorage`].

mod baseline;
mod engine;
mod hardware;
mod native;
mod portable;

pub use engine::MAX_KEY_LEN;
pub use hardware::HardwareKeyring;
pub use native::has_aes_instructions;

use crate::algorithm::{CipherAlgorithm, HashAlgorithm, KeyPurpose, SignatureAlgorithm};
use crate::envelope::DEFAULT_PASSWORD_ITERATIONS;
use crate::error::CryptoError;
use crate::keys::KeyStore;
use crate::options::EncryptionOptions;
use bastion_logger::SecureLogger;
use bastion_storage::SecureStorage;
use std::sync::Arc;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use typed_builder::TypedBuilder;

/// Backend family. Parsed case-insensitively from the `provider` environment parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    Native,
    Portable,
    Baseline,
}

/// What a provider instance can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub kind: ProviderKind,
    pub ciphers: &'static [CipherAlgorithm],
    /// Cipher used when the caller does not pick one.
    pub default_cipher: CipherAlgorithm,
    pub hashes: &'static [HashAlgorithm],
    pub signatures: &'static [SignatureAlgorithm],
    /// A hardware keyring is attached.
    pub hardware_backed: bool,
    pub aes_acceleration: bool,
}

impl Capabilities {
    #[must_use]
    pub fn for_kind(kind: ProviderKind, hardware_backed: bool) -> Self {
        match kind {
            ProviderKind::Native => native::capabilities(hardware_backed),
            ProviderKind::Portable => portable::capabilities(),
            ProviderKind::Baseline => baseline::capabilities(),
        }
    }

    pub fn supports_cipher(&self, cipher: CipherAlgorithm) -> bool {
        self.ciphers.contains(&cipher)
    }

    pub fn supports_hash(&self, hash: HashAlgorithm) -> bool {
        self.hashes.contains(&hash)
    }

    pub fn supports_signature(&self, algorithm: SignatureAlgorithm) -> bool {
        self.signatures.contains(&algorithm)
    }
}

/// Construction parameters for a [`CryptoProvider`].
///
/// ```rust
/// use bastion_crypto::provider::{ProviderConfig, ProviderKind};
///
/// let config = ProviderConfig::builder()
///     .kind(ProviderKind::Native)
///     .hardware(true)
///     .allow_fallback(false)
///     .build();
/// assert_eq!(config.password_iterations, 600_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Attach a [`HardwareKeyring`]. Honoured by the native provider only.
    #[builder(default)]
    pub hardware: bool,
    /// Hardware requests that cannot be served fall back to software keys instead of
    /// failing with [`CryptoError::UnsupportedOperation`].
    #[builder(default = true)]
    pub allow_fallback: bool,
    #[builder(default = DEFAULT_PASSWORD_ITERATIONS)]
    pub password_iterations: u32,
}

/// Identifiers of a freshly generated signature key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPairIds {
    pub public_id: String,
    pub private_id: String,
}

/// The cryptographic operation set.
///
/// Every operation takes identifiers of objects in secure storage and, where it produces
/// something, stores it and returns the new identifier. Only
/// [`export_public_key`](Self::export_public_key) returns key bytes.
pub trait CryptoEngine: Send + Sync {
    /// Encrypts the object `data_id` under `key_id` into a symmetric envelope.
    fn encrypt(
        &self,
        data_id: &str,
        key_id: &str,
        options: &EncryptionOptions,
    ) -> impl Future<Output = Result<String, CryptoError>> + Send;

    /// Opens a symmetric envelope. Without `key_id` the embedded identifier is used.
    fn decrypt(
        &self,
        encrypted_id: &str,
        key_id: Option<&str>,
        options: &EncryptionOptions,
    ) -> impl Future<Output = Result<String, CryptoError>> + Send;

    fn encrypt_with_password(
        &self,
        data_id: &str,
        password: &str,
        options: &EncryptionOptions,
    ) -> impl Future<Output = Result<String, CryptoError>> + Send;

    /// A wrong password and a corrupted ciphertext fail identically with
    /// [`CryptoError::AuthenticationFailed`].
    fn decrypt_with_password(
        &self,
        encrypted_id: &str,
        password: &str,
        options: &EncryptionOptions,
    ) -> impl Future<Output = Result<String, CryptoError>> + Send;

    fn hash(
        &self,
        data_id: &str,
        options: &EncryptionOptions,
    ) -> impl Future<Output = Result<String, CryptoError>> + Send;

    /// Mismatch is `Ok(false)`.
    fn verify_hash(
        &self,
        data_id: &str,
        hash_id: &str,
        options: &EncryptionOptions,
    ) -> impl Future<Output = Result<bool, CryptoError>> + Send;

    fn compute_hmac(
        &self,
        data_id: &str,
        key_id: &str,
        options: &EncryptionOptions,
    ) -> impl Future<Output = Result<String, CryptoError>> + Send;

    /// Constant-time comparison; mismatch is `Ok(false)`.
    fn verify_hmac(
        &self,
        data_id: &str,
        hmac_id: &str,
        key_id: &str,
        options: &EncryptionOptions,
    ) -> impl Future<Output = Result<bool, CryptoError>> + Send;

    /// Generates `length` random bytes (1..=1024) under `key_id`.
    fn generate_key(
        &self,
        length: usize,
        key_id: &str,
        purpose: KeyPurpose,
        options: &EncryptionOptions,
    ) -> impl Future<Output = Result<bool, CryptoError>> + Send;

    /// HKDF from a stored master key into a new stored key; returns its identifier.
    fn derive_key(
        &self,
        master_key_id: &str,
        salt: Option<&[u8]>,
        info: Option<&[u8]>,
        output_length: usize,
        options: &EncryptionOptions,
    ) -> impl Future<Output = Result<String, CryptoError>> + Send;

    fn generate_signature_key_pair(
        &self,
        algorithm: SignatureAlgorithm,
        use_hardware_if_available: bool,
        options: &EncryptionOptions,
    ) -> impl Future<Output = Result<KeyPairIds, CryptoError>> + Send;

    fn sign_data(
        &self,
        data_id: &str,
        private_key_id: &str,
        options: &EncryptionOptions,
    ) -> impl Future<Output = Result<String, CryptoError>> + Send;

    /// Mismatch is `Ok(false)`.
    fn verify_signature(
        &self,
        signature_id: &str,
        data_id: &str,
        public_key_id: &str,
        options: &EncryptionOptions,
    ) -> impl Future<Output = Result<bool, CryptoError>> + Send;

    /// SEC1 uncompressed point for ECDSA, the raw 32-byte point for Ed25519.
    fn export_public_key(
        &self,
        public_key_id: &str,
    ) -> impl Future<Output = Result<Vec<u8>, CryptoError>> + Send;

    fn capabilities(&self) -> &Capabilities;
}

pub(crate) struct ProviderInner<S> {
    pub(crate) capabilities: Capabilities,
    pub(crate) storage: S,
    pub(crate) keys: KeyStore<S>,
    pub(crate) hardware: Option<HardwareKeyring>,
    pub(crate) logger: Arc<dyn SecureLogger>,
    pub(crate) password_iterations: u32,
    pub(crate) allow_fallback: bool,
}

/// Cheaply clonable [`CryptoEngine`] over a [`SecureStorage`].
///
/// ```rust
/// use bastion_crypto::prelude::*;
/// use bastion_logger::TracingLogger;
/// use bastion_storage::{MemoryStorage, SecureStorage};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), CryptoError> {
/// let storage = MemoryStorage::new();
/// let config = ProviderConfig::builder().kind(ProviderKind::Portable).build();
/// let provider = CryptoProvider::new(config, storage.clone(), Arc::new(TracingLogger::new()));
///
/// provider.generate_key(32, "k1", KeyPurpose::Encryption, &EncryptionOptions::default()).await?;
/// storage.store("d1", b"hello world", Default::default()).await?;
///
/// let sealed = provider.encrypt("d1", "k1", &EncryptionOptions::default()).await?;
/// let opened = provider.decrypt(&sealed, None, &EncryptionOptions::default()).await?;
/// assert_eq!(storage.retrieve(&opened).await?, b"hello world");
/// # Ok(())
/// # }
/// ```
pub struct CryptoProvider<S> {
    pub(crate) inner: Arc<ProviderInner<S>>,
}

impl<S> Clone for CryptoProvider<S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<S> std::fmt::Debug for CryptoProvider<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoProvider")
            .field("capabilities", &self.inner.capabilities)
            .field("hardware", &self.inner.hardware)
            .field("allow_fallback", &self.inner.allow_fallback)
            .finish_non_exhaustive()
    }
}

impl<S: SecureStorage + Clone> CryptoProvider<S> {
    /// Provider with its own [`KeyStore`] over `storage`.
    pub fn new(config: ProviderConfig, storage: S, logger: Arc<dyn SecureLogger>) -> Self {
        let keys = KeyStore::new(storage.clone());
        Self::assemble(config, storage, keys, logger)
    }

    /// Provider sharing an existing [`KeyStore`] (and its lock), e.g. with a
    /// [`KeyManagementService`](crate::keys::KeyManagementService).
    pub fn with_key_store(
        config: ProviderConfig,
        keys: KeyStore<S>,
        logger: Arc<dyn SecureLogger>,
    ) -> Self {
        let storage = keys.storage().clone();
        Self::assemble(config, storage, keys, logger)
    }

    fn assemble(
        config: ProviderConfig,
        storage: S,
        keys: KeyStore<S>,
        logger: Arc<dyn SecureLogger>,
    ) -> Self {
        let attach = config.hardware && config.kind == ProviderKind::Native;
        let hardware = attach.then(|| keys.attach_hardware());
        let capabilities = Capabilities::for_kind(config.kind, hardware.is_some());
        tracing::info!(
            kind = %config.kind,
            default_cipher = %capabilities.default_cipher,
            hardware = hardware.is_some(),
            "Crypto provider ready"
        );
        Self {
            inner: Arc::new(ProviderInner {
                capabilities,
                storage,
                keys,
                hardware,
                logger,
                password_iterations: config.password_iterations.max(DEFAULT_PASSWORD_ITERATIONS),
                allow_fallback: config.allow_fallback,
            }),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.inner.capabilities.kind
    }

    pub fn storage(&self) -> &S {
        &self.inner.storage
    }

    pub fn key_store(&self) -> &KeyStore<S> {
        &self.inner.keys
    }

    pub fn hardware(&self) -> Option<&HardwareKeyring> {
        self.inner.hardware.as_ref()
    }
}
