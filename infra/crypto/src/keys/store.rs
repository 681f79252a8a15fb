use crate::algorithm::{KeyPurpose, KeyRole};
use crate::error::CryptoError;
use crate::keys::identifier::sanitize;
use crate::keys::material::{HardwareRef, KeyAttributes, KeyEntry, KeyMaterial};
use crate::metadata::{self, MetadataExt};
use crate::provider::HardwareKeyring;
use bastion_storage::{MemoryStorage, Metadata, SecureStorage};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tracing::debug;
use zeroize::Zeroizing;

/// Storage prefix owned by the key store.
pub const KEY_NAMESPACE: &str = "keys/";

/// Persists key material under a private namespace of a [`SecureStorage`].
///
/// Writers take the exclusive side of a shared lock and readers the shared side, so a
/// read never observes a half-applied mutation. Clones share the storage handle, the
/// lock and the attached [`HardwareKeyring`].
///
/// Overwriting or deleting a hardware reference destroys its keyring slot.
#[derive(Debug)]
pub struct KeyStore<S> {
    storage: S,
    lock: Arc<RwLock<()>>,
    hardware: Arc<OnceLock<HardwareKeyring>>,
}

impl<S: Clone> Clone for KeyStore<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            lock: Arc::clone(&self.lock),
            hardware: Arc::clone(&self.hardware),
        }
    }
}

impl KeyStore<MemoryStorage> {
    /// Process-local store; keys are lost when the last handle is dropped.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }
}

impl<S: SecureStorage> KeyStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage, lock: Arc::new(RwLock::new(())), hardware: Arc::default() }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Keyring backing this store's hardware references, created on first call.
    pub(crate) fn attach_hardware(&self) -> HardwareKeyring {
        self.hardware.get_or_init(HardwareKeyring::new).clone()
    }

    fn locate(id: &str) -> Result<(String, String), CryptoError> {
        let id = sanitize(id)?;
        let path = format!("{KEY_NAMESPACE}{id}");
        Ok((id, path))
    }

    /// Stores raw bytes as a general-purpose key, replacing any previous value.
    pub async fn store(&self, id: &str, bytes: &[u8]) -> Result<(), CryptoError> {
        let attributes = KeyAttributes::default();
        self.store_material(id, &KeyMaterial::raw(bytes), &attributes).await.map(|_| ())
    }

    /// Stores key material with its attributes. Returns the sanitised identifier.
    pub async fn store_material(
        &self,
        id: &str,
        material: &KeyMaterial,
        attributes: &KeyAttributes,
    ) -> Result<String, CryptoError> {
        let (id, path) = Self::locate(id)?;
        let _guard = self.lock.write().await;
        self.persist(&path, material, attributes).await?;
        Ok(id)
    }

    /// Raw key bytes, or `None` when absent.
    ///
    /// # Errors
    /// [`CryptoError::UnsupportedOperation`] for hardware-resident keys.
    pub async fn get(&self, id: &str) -> Result<Option<Zeroizing<Vec<u8>>>, CryptoError> {
        match self.get_entry(id).await? {
            None => Ok(None),
            Some(KeyEntry { material: KeyMaterial::Raw(bytes), .. }) => Ok(Some(bytes)),
            Some(KeyEntry { material: KeyMaterial::Hardware(_), .. }) => {
                Err(CryptoError::unsupported_operation(
                    "hardware-resident key material is not exportable",
                ))
            },
        }
    }

    /// Key material together with its stored attributes, or `None` when absent.
    pub async fn get_entry(&self, id: &str) -> Result<Option<KeyEntry>, CryptoError> {
        let (id, path) = Self::locate(id)?;
        let _guard = self.lock.read().await;
        self.load(id, &path).await
    }

    /// Removes a key. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> Result<bool, CryptoError> {
        let (_, path) = Self::locate(id)?;
        let _guard = self.lock.write().await;
        if !self.storage.exists(&path).await? {
            return Ok(false);
        }
        let previous = self.resident_slot(&path).await?;
        self.storage.delete(&path).await?;
        self.release(previous, None);
        debug!("Key deleted");
        Ok(true)
    }

    pub async fn contains(&self, id: &str) -> Result<bool, CryptoError> {
        let (_, path) = Self::locate(id)?;
        let _guard = self.lock.read().await;
        Ok(self.storage.exists(&path).await?)
    }

    /// Sanitised identifiers of every stored key, sorted.
    pub async fn list_identifiers(&self) -> Result<Vec<String>, CryptoError> {
        let _guard = self.lock.read().await;
        let mut ids: Vec<String> = self
            .storage
            .list(KEY_NAMESPACE)
            .await?
            .into_iter()
            .filter_map(|path| path.strip_prefix(KEY_NAMESPACE).map(str::to_owned))
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Exclusive access for a read-modify-write sequence. Other handles sharing this
    /// store block until the returned [`KeyWriter`] is dropped.
    pub(crate) async fn writer(&self) -> KeyWriter<'_, S> {
        KeyWriter { store: self, _guard: self.lock.write().await }
    }

    async fn load(&self, id: String, path: &str) -> Result<Option<KeyEntry>, CryptoError> {
        let bytes = match self.storage.retrieve(path).await {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let meta = match self.storage.metadata(path).await {
            Ok(meta) => meta,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let material = if meta.get(metadata::KEY_MATERIAL).map(String::as_str) == Some("hardware") {
            let token = String::from_utf8(bytes.to_vec())
                .map_err(|_| CryptoError::data_corrupted("hardware key reference is not UTF-8"))?;
            KeyMaterial::Hardware(HardwareRef(token))
        } else {
            KeyMaterial::Raw(bytes)
        };

        Ok(Some(KeyEntry {
            id,
            material,
            attributes: attributes_from(&meta),
            created_at: meta.get(metadata::CREATED_AT).cloned(),
        }))
    }

    async fn persist(
        &self,
        path: &str,
        material: &KeyMaterial,
        attributes: &KeyAttributes,
    ) -> Result<(), CryptoError> {
        let previous = self.resident_slot(path).await?;
        let mut meta = metadata::record(metadata::kind::KEY)
            .with(metadata::KEY_PURPOSE, attributes.purpose)
            .with(metadata::KEY_MATERIAL, material.kind());
        if let Some(algorithm) = &attributes.algorithm {
            meta.insert(metadata::ALGORITHM.to_owned(), algorithm.clone());
        }
        if let Some(role) = attributes.role {
            meta.insert(metadata::KEY_ROLE.to_owned(), role.to_string());
        }
        if let Some(fingerprint) = &attributes.fingerprint {
            meta.insert(metadata::KEY_FINGERPRINT.to_owned(), fingerprint.clone());
        }
        self.storage.store(path, material.stored_bytes(), meta).await?;
        self.release(previous, Some(material));
        debug!(material = material.kind(), "Key stored");
        Ok(())
    }

    /// Hardware reference currently stored at `path`, when a keyring is attached.
    async fn resident_slot(&self, path: &str) -> Result<Option<HardwareRef>, CryptoError> {
        if self.hardware.get().is_none() {
            return Ok(None);
        }
        Ok(self.load(String::new(), path).await?.and_then(|entry| match entry.material {
            KeyMaterial::Hardware(reference) => Some(reference),
            KeyMaterial::Raw(_) => None,
        }))
    }

    fn release(&self, previous: Option<HardwareRef>, replacement: Option<&KeyMaterial>) {
        let (Some(previous), Some(keyring)) = (previous, self.hardware.get()) else { return };
        if matches!(replacement, Some(KeyMaterial::Hardware(next)) if *next == previous) {
            return;
        }
        if keyring.destroy(&previous) {
            debug!("Hardware slot released");
        }
    }
}

/// Write-locked view of a [`KeyStore`].
pub(crate) struct KeyWriter<'a, S> {
    store: &'a KeyStore<S>,
    _guard: tokio::sync::RwLockWriteGuard<'a, ()>,
}

impl<S: SecureStorage> KeyWriter<'_, S> {
    pub(crate) async fn entry(&self, id: &str) -> Result<Option<KeyEntry>, CryptoError> {
        let (id, path) = KeyStore::<S>::locate(id)?;
        self.store.load(id, &path).await
    }

    pub(crate) async fn store(
        &self,
        id: &str,
        material: &KeyMaterial,
        attributes: &KeyAttributes,
    ) -> Result<(), CryptoError> {
        let (_, path) = KeyStore::<S>::locate(id)?;
        self.store.persist(&path, material, attributes).await
    }
}

fn attributes_from(meta: &Metadata) -> KeyAttributes {
    KeyAttributes {
        purpose: meta
            .get(metadata::KEY_PURPOSE)
            .and_then(|p| KeyPurpose::from_str(p).ok())
            .unwrap_or_default(),
        algorithm: meta.get(metadata::ALGORITHM).cloned(),
        role: meta.get(metadata::KEY_ROLE).and_then(|r| KeyRole::from_str(r).ok()),
        fingerprint: meta.get(metadata::KEY_FINGERPRINT).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn identifiers_are_sanitised_on_every_path() {
        let store = KeyStore::in_memory();
        store.store("tenant:a/primary", b"secret").await.unwrap();

        assert!(store.contains("tenant_a_primary").await.unwrap());
        assert_eq!(store.get(" tenant:a/primary ").await.unwrap().unwrap().as_slice(), b"secret");
        assert_eq!(store.list_identifiers().await.unwrap(), ["tenant_a_primary"]);
        assert!(store.storage().exists("keys/tenant_a_primary").await.unwrap());
    }

    #[tokio::test]
    async fn store_overwrites_and_delete_reports_presence() {
        let store = KeyStore::in_memory();
        store.store("k", b"one").await.unwrap();
        store.store("k", b"two").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().unwrap().as_slice(), b"two");

        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn attributes_survive_a_round_trip() {
        let store = KeyStore::in_memory();
        let attributes = KeyAttributes::new(KeyPurpose::Signing)
            .algorithm("Ed25519")
            .role(KeyRole::Public)
            .fingerprint("ab");
        let material = KeyMaterial::raw([9u8; 32]);
        let id = store.store_material("pub/1", &material, &attributes).await.unwrap();
        assert_eq!(id, "pub_1");

        let entry = store.get_entry(&id).await.unwrap().unwrap();
        assert_eq!(entry.attributes, attributes);
        assert!(entry.created_at.is_some());
    }

    #[tokio::test]
    async fn hardware_references_are_not_exportable() {
        let store = KeyStore::in_memory();
        let material = KeyMaterial::Hardware(HardwareRef("hw-token".to_owned()));
        store.store_material("hw", &material, &KeyAttributes::default()).await.unwrap();

        assert_eq!(store.get("hw").await.unwrap_err().kind(), ErrorKind::UnsupportedOperation);
        let entry = store.get_entry("hw").await.unwrap().unwrap();
        assert!(entry.material.is_hardware());
    }

    #[tokio::test]
    async fn empty_identifier_is_invalid_input() {
        let store = KeyStore::in_memory();
        assert_eq!(store.get("  ").await.unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn replaced_and_deleted_hardware_slots_are_destroyed() {
        let store = KeyStore::in_memory();
        let keyring = store.attach_hardware();
        let first = KeyMaterial::Hardware(keyring.generate_symmetric().unwrap());
        let second = KeyMaterial::Hardware(keyring.generate_symmetric().unwrap());

        store.store_material("hw", &first, &KeyAttributes::default()).await.unwrap();
        store.store_material("hw", &first, &KeyAttributes::default()).await.unwrap();
        assert_eq!(keyring.len(), 2, "rewriting the same reference keeps its slot");

        store.store_material("hw", &second, &KeyAttributes::default()).await.unwrap();
        assert_eq!(keyring.len(), 1);
        store.store("hw", b"software").await.unwrap();
        assert_eq!(keyring.len(), 0);

        let third = KeyMaterial::Hardware(keyring.generate_symmetric().unwrap());
        store.store_material("hw", &third, &KeyAttributes::default()).await.unwrap();
        assert!(store.delete("hw").await.unwrap());
        assert!(keyring.is_empty());
    }

    #[tokio::test]
    async fn writer_excludes_other_handles() {
        let store = KeyStore::in_memory();
        let other = store.clone();
        let writer = store.writer().await;
        writer.store("k", &KeyMaterial::raw([1u8; 4]), &KeyAttributes::default()).await.unwrap();

        let pending =
            tokio::spawn(async move { other.get("k").await.map(|k| k.map(|b| b.to_vec())) });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());
        drop(writer);
        assert_eq!(pending.await.unwrap().unwrap(), Some(vec![1u8; 4]));
    }
}
