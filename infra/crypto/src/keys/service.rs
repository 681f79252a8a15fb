use crate::algorithm::CipherAlgorithm;
use crate::envelope::SymmetricEnvelope;
use crate::error::CryptoError;
use crate::keys::identifier::sanitize;
use crate::keys::material::KeyMaterial;
use crate::keys::store::KeyStore;
use crate::logging::Operation;
use crate::primitives::{aead, random};
use bastion_logger::{LogMetadata, SecureLogger};
use bastion_storage::SecureStorage;
use std::fmt;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio::sync::Mutex;
use zeroize::Zeroizing;

/// Outcome of [`KeyManagementService::rotate_key`].
pub struct RotatedKey {
    pub key: Zeroizing<Vec<u8>>,
    /// The supplied envelope, re-encrypted under `key`.
    pub reencrypted: Option<Vec<u8>>,
}

impl fmt::Debug for RotatedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatedKey")
            .field("key_len", &self.key.len())
            .field("reencrypted", &self.reencrypted.as_ref().map(Vec::len))
            .finish()
    }
}

/// Key lifecycle over a [`KeyStore`]: retrieve, store, delete, rotate and list.
///
/// Mutations are totally ordered by a single writer lock held for the whole operation,
/// including the decrypt/re-encrypt step of a rotation. Every call is logged with the key
/// identifier tagged private; key bytes never reach the logger.
///
/// ```rust
/// use bastion_crypto::keys::{KeyManagementService, KeyStore};
/// use bastion_logger::TracingLogger;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), bastion_crypto::CryptoError> {
/// let kms = KeyManagementService::new(KeyStore::in_memory(), Arc::new(TracingLogger::new()));
/// kms.store_key(&[7u8; 32], "orders/primary").await?;
///
/// let rotated = kms.rotate_key("orders/primary", None).await?;
/// assert_ne!(rotated.key.as_slice(), &[7u8; 32]);
/// assert_eq!(kms.list_key_identifiers().await?, ["orders_primary"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct KeyManagementService<S> {
    keys: KeyStore<S>,
    writer: Arc<Mutex<()>>,
    logger: Arc<dyn SecureLogger>,
    cipher: CipherAlgorithm,
}

impl<S: Clone> Clone for KeyManagementService<S> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            writer: Arc::clone(&self.writer),
            logger: Arc::clone(&self.logger),
            cipher: self.cipher,
        }
    }
}

impl<S: SecureStorage> KeyManagementService<S> {
    pub fn new(keys: KeyStore<S>, logger: Arc<dyn SecureLogger>) -> Self {
        Self { keys, writer: Arc::new(Mutex::new(())), logger, cipher: CipherAlgorithm::Aes256Gcm }
    }

    /// Cipher tried first when re-encrypting during rotation.
    #[must_use]
    pub const fn with_cipher(mut self, cipher: CipherAlgorithm) -> Self {
        self.cipher = cipher;
        self
    }

    pub const fn key_store(&self) -> &KeyStore<S> {
        &self.keys
    }

    fn op(&self, name: &'static str, id: &str) -> Operation<'_> {
        Operation::start(self.logger.as_ref(), name, LogMetadata::new().private("key_id", id))
    }

    /// # Errors
    /// * [`CryptoError::KeyNotFound`] when absent.
    /// * [`CryptoError::UnsupportedOperation`] for hardware-resident keys.
    pub async fn retrieve_key(&self, id: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let op = self.op("retrieve_key", id);
        let result = async {
            let id = sanitize(id)?;
            self.keys.get(&id).await?.ok_or_else(|| CryptoError::key_not_found(&id))
        };
        op.finish(result.await)
    }

    /// Stores raw key bytes, replacing any key with the same identifier.
    pub async fn store_key(&self, bytes: &[u8], id: &str) -> Result<(), CryptoError> {
        let op = self.op("store_key", id);
        let result = async {
            let id = sanitize(id)?;
            if bytes.is_empty() {
                return Err(CryptoError::invalid_input("key material is empty"));
            }
            let _writer = self.writer.lock().await;
            self.keys.store(&id, bytes).await
        };
        op.finish(result.await)
    }

    pub async fn delete_key(&self, id: &str) -> Result<(), CryptoError> {
        let op = self.op("delete_key", id);
        let result = async {
            let id = sanitize(id)?;
            let _writer = self.writer.lock().await;
            if self.keys.delete(&id).await? { Ok(()) } else { Err(CryptoError::key_not_found(&id)) }
        };
        op.finish(result.await)
    }

    /// Replaces a key in place with fresh random bytes of the same length and purpose.
    ///
    /// When `envelope` is given it must be a symmetric envelope under the current key
    /// without associated data. It is decrypted with the old key and re-encrypted with the
    /// new one, keeping its cipher and embedded key id, before the new key is committed.
    /// Any other ciphertext under the old key becomes undecryptable.
    ///
    /// # Errors
    /// * [`CryptoError::KeyNotFound`] when absent.
    /// * [`CryptoError::UnsupportedOperation`] for hardware-resident keys and key pair halves.
    /// * [`CryptoError::DataCorrupted`] / [`CryptoError::AuthenticationFailed`] when the
    ///   envelope does not open under the current key; the key is left unchanged.
    pub async fn rotate_key(
        &self,
        id: &str,
        envelope: Option<&[u8]>,
    ) -> Result<RotatedKey, CryptoError> {
        let op = self.op("rotate_key", id);
        let result = async {
            let id = sanitize(id)?;
            let _writer = self.writer.lock().await;
            let keys = self.keys.writer().await;

            let entry = keys.entry(&id).await?.ok_or_else(|| CryptoError::key_not_found(&id))?;
            if entry.attributes.role.is_some() {
                return Err(CryptoError::unsupported_operation(
                    "signature key pairs are rotated by generating a new pair",
                ));
            }
            let KeyMaterial::Raw(old_key) = entry.material else {
                return Err(CryptoError::unsupported_operation(
                    "hardware-resident keys cannot be rotated in place",
                ));
            };

            let new_key = random::secret(old_key.len())?;
            let reencrypted = match envelope {
                Some(blob) => Some(self.reencrypt(&id, blob, &old_key, &new_key)?),
                None => None,
            };

            keys.store(&id, &KeyMaterial::Raw(new_key.clone()), &entry.attributes).await?;
            Ok(RotatedKey { key: new_key, reencrypted })
        };
        op.finish(result.await)
    }

    fn reencrypt(
        &self,
        id: &str,
        blob: &[u8],
        old_key: &[u8],
        new_key: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let envelope = SymmetricEnvelope::decode_for_key(blob, id)?;
        let others = CipherAlgorithm::iter().filter(|c| *c != self.cipher);
        let ciphers = std::iter::once(self.cipher).chain(others);

        let mut last_err = None;
        for cipher in ciphers {
            match aead::open(cipher, old_key, &envelope.nonce, &envelope.sealed, &[]) {
                Ok(plaintext) => {
                    let nonce = random::array()?;
                    let sealed = aead::seal(cipher, new_key, &nonce, &plaintext, &[])?;
                    return SymmetricEnvelope::new(nonce, sealed, envelope.key_id).encode();
                },
                Err(err) => last_err = Some(err),
            }
        }
        let rejected = || CryptoError::authentication_failed("no cipher accepted the envelope");
        Err(last_err.unwrap_or_else(rejected))
    }

    pub async fn list_key_identifiers(&self) -> Result<Vec<String>, CryptoError> {
        let op = Operation::start(self.logger.as_ref(), "list_key_identifiers", LogMetadata::new());
        op.finish(self.keys.list_identifiers().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::keys::material::{HardwareRef, KeyAttributes};
    use bastion_logger::CapturingLogger;
    use bastion_storage::MemoryStorage;

    fn kms() -> (KeyManagementService<MemoryStorage>, Arc<CapturingLogger>) {
        let logger = Arc::new(CapturingLogger::new());
        (KeyManagementService::new(KeyStore::in_memory(), logger.clone()), logger)
    }

    fn seal_under(key: &[u8], key_id: &str, plaintext: &[u8]) -> Vec<u8> {
        let nonce = [4u8; 12];
        let sealed = aead::seal(CipherAlgorithm::Aes256Gcm, key, &nonce, plaintext, &[]).unwrap();
        SymmetricEnvelope::new(nonce, sealed, Some(key_id.to_owned())).encode().unwrap()
    }

    #[tokio::test]
    async fn lifecycle() {
        let (kms, _) = kms();
        kms.store_key(&[1u8; 32], "k1").await.unwrap();
        assert_eq!(kms.retrieve_key("k1").await.unwrap().as_slice(), &[1u8; 32]);
        assert_eq!(kms.list_key_identifiers().await.unwrap(), ["k1"]);

        kms.delete_key("k1").await.unwrap();
        assert_eq!(kms.delete_key("k1").await.unwrap_err().kind(), ErrorKind::KeyNotFound);
        assert_eq!(kms.retrieve_key("k1").await.unwrap_err().kind(), ErrorKind::KeyNotFound);
    }

    #[tokio::test]
    async fn inputs_are_validated_first() {
        let (kms, _) = kms();
        assert_eq!(kms.store_key(&[], "k").await.unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(kms.store_key(&[1], "").await.unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(kms.retrieve_key(" ").await.unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(kms.rotate_key("", None).await.unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn rotation_reencrypts_the_supplied_envelope() {
        let (kms, _) = kms();
        let old_key = [3u8; 32];
        kms.store_key(&old_key, "k1").await.unwrap();
        let blob = seal_under(&old_key, "k1", b"ledger");

        let rotated = kms.rotate_key("k1", Some(blob.as_slice())).await.unwrap();
        let current = kms.retrieve_key("k1").await.unwrap();
        assert_eq!(current.as_slice(), rotated.key.as_slice());
        assert_ne!(current.as_slice(), &old_key);
        assert_eq!(current.len(), old_key.len());

        let reencrypted = rotated.reencrypted.unwrap();
        let envelope = SymmetricEnvelope::decode_for_key(&reencrypted, "k1").unwrap();
        assert_eq!(envelope.key_id.as_deref(), Some("k1"));
        let (nonce, sealed) = (&envelope.nonce, &envelope.sealed);
        let plaintext =
            aead::open(CipherAlgorithm::Aes256Gcm, &current, nonce, sealed, &[]).unwrap();
        assert_eq!(plaintext.as_slice(), b"ledger");
    }

    #[tokio::test]
    async fn failed_reencryption_keeps_the_old_key() {
        let (kms, _) = kms();
        kms.store_key(&[3u8; 32], "k1").await.unwrap();
        let foreign = seal_under(&[9u8; 32], "k1", b"ledger");

        let err = kms.rotate_key("k1", Some(foreign.as_slice())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(kms.retrieve_key("k1").await.unwrap().as_slice(), &[3u8; 32]);

        let err = kms.rotate_key("k1", Some([0u8; 5].as_slice())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataCorrupted);
    }

    #[tokio::test]
    async fn hardware_keys_are_neither_exported_nor_rotated() {
        let (kms, _) = kms();
        let material = KeyMaterial::Hardware(HardwareRef("hw-1".to_owned()));
        kms.key_store().store_material("hw", &material, &KeyAttributes::default()).await.unwrap();

        let err = kms.retrieve_key("hw").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
        let err = kms.rotate_key("hw", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    #[tokio::test]
    async fn logs_carry_outcomes_but_never_key_bytes() {
        let (kms, logger) = kms();
        kms.store_key(b"super-secret-key-bytes", "audit-key").await.unwrap();
        let _ = kms.retrieve_key("missing").await;

        assert!(!logger.contains("super-secret-key-bytes"));
        let failures = logger.entries_for("retrieve_key");
        assert_eq!(failures.last().unwrap().message, "Failed(KeyNotFound)");
        let field = failures[0].metadata.get("key_id").unwrap();
        assert_eq!(field.privacy, bastion_logger::PrivacyLevel::Private);
    }
}
