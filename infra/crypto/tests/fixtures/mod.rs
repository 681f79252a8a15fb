#![allow(dead_code)]

use bastion_crypto::prelude::*;
use bastion_logger::CapturingLogger;
use bastion_storage::{MemoryStorage, Metadata, SecureStorage};
use std::sync::Arc;

pub const HELLO: &[u8] = b"hello world";

/// Provider over fresh in-memory storage with a capturing logger.
#[derive(Debug)]
pub struct Harness {
    pub storage: MemoryStorage,
    pub provider: CryptoProvider<MemoryStorage>,
    pub logger: Arc<CapturingLogger>,
}

impl Harness {
    #[must_use]
    pub fn new(kind: ProviderKind) -> Self {
        Self::with_config(ProviderConfig::builder().kind(kind).build())
    }

    #[must_use]
    pub fn hardware(allow_fallback: bool) -> Self {
        Self::with_config(
            ProviderConfig::builder()
                .kind(ProviderKind::Native)
                .hardware(true)
                .allow_fallback(allow_fallback)
                .build(),
        )
    }

    #[must_use]
    pub fn with_config(config: ProviderConfig) -> Self {
        let storage = MemoryStorage::new();
        let logger = Arc::new(CapturingLogger::new());
        let provider = CryptoProvider::new(config, storage.clone(), logger.clone());
        Self { storage, provider, logger }
    }

    /// # Panics
    /// * If the in-memory store rejects the identifier.
    pub async fn put(&self, id: &str, bytes: &[u8]) {
        self.storage.store(id, bytes, Metadata::new()).await.expect("store fixture data");
    }

    /// # Panics
    /// * If the object is missing.
    pub async fn read(&self, id: &str) -> Vec<u8> {
        self.storage.retrieve(id).await.expect("stored object")
    }

    /// Rewrites an object in place, keeping its metadata.
    ///
    /// # Panics
    /// * If the object is missing.
    pub async fn tamper(&self, id: &str, mutate: impl FnOnce(&mut Vec<u8>)) {
        let mut bytes = self.read(id).await;
        let meta = self.storage.metadata(id).await.expect("stored metadata");
        mutate(&mut bytes);
        self.storage.store(id, &bytes, meta).await.expect("rewrite object");
    }

    /// Generates a 32-byte encryption key.
    ///
    /// # Panics
    /// * If key generation fails.
    pub async fn key(&self, id: &str) {
        self.provider
            .generate_key(32, id, KeyPurpose::Encryption, &opts())
            .await
            .expect("generate key");
    }
}

#[must_use]
pub fn opts() -> EncryptionOptions {
    EncryptionOptions::default()
}
