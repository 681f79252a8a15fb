pub mod fixtures;

use bastion_crypto::keys::{KeyAttributes, MAX_KEY_ID_LEN};
use bastion_crypto::prelude::*;
use bastion_logger::CapturingLogger;
use bastion_storage::{FileStorage, SecureStorage};
use fixtures::*;
use std::sync::Arc;
use tempfile::TempDir;

fn kms_for(h: &Harness) -> KeyManagementService<bastion_storage::MemoryStorage> {
    KeyManagementService::new(h.provider.key_store().clone(), h.logger.clone())
}

#[tokio::test]
async fn test_rotation_reencrypts_the_supplied_envelope() {
    let h = Harness::new(ProviderKind::Portable);
    let kms = kms_for(&h);
    h.key("k1").await;
    h.put("d1", HELLO).await;

    let e1 = h.provider.encrypt("d1", "k1", &opts()).await.unwrap();
    let stale = h.provider.encrypt("d1", "k1", &opts()).await.unwrap();
    let old_key = kms.retrieve_key("k1").await.unwrap();

    let rotated = kms.rotate_key("k1", Some(&h.read(&e1).await)).await.unwrap();
    assert_ne!(rotated.key, old_key);
    assert_eq!(rotated.key.len(), 32);
    assert_eq!(kms.retrieve_key("k1").await.unwrap(), rotated.key);

    let reencrypted = rotated.reencrypted.unwrap();
    assert_eq!(&reencrypted[reencrypted.len() - 3..], &[2, b'k', b'1'], "embedded id survives");
    h.tamper(&e1, |blob| *blob = reencrypted).await;

    let plain = h.provider.decrypt(&e1, None, &opts()).await.unwrap();
    assert_eq!(h.read(&plain).await, HELLO);

    let err = h.provider.decrypt(&stale, None, &opts()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);

    let entry = h.provider.key_store().get_entry("k1").await.unwrap().unwrap();
    assert_eq!(entry.attributes, KeyAttributes::new(KeyPurpose::Encryption));
}

#[tokio::test]
async fn test_rotation_with_foreign_envelope_keeps_the_key() {
    let h = Harness::new(ProviderKind::Portable);
    let kms = kms_for(&h);
    h.key("k1").await;
    h.key("k2").await;
    h.put("d1", HELLO).await;

    let under_k2 = h.provider.encrypt("d1", "k2", &opts()).await.unwrap();
    let before = kms.retrieve_key("k1").await.unwrap();

    let err = kms.rotate_key("k1", Some(&h.read(&under_k2).await)).await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::AuthenticationFailed | ErrorKind::DataCorrupted));
    assert_eq!(kms.retrieve_key("k1").await.unwrap(), before);
}

#[tokio::test]
async fn test_signature_pairs_are_not_rotated() {
    let h = Harness::new(ProviderKind::Portable);
    let kms = kms_for(&h);
    let pair = h
        .provider
        .generate_signature_key_pair(SignatureAlgorithm::Ed25519, false, &opts())
        .await
        .unwrap();

    for id in [&pair.public_id, &pair.private_id] {
        let err = kms.rotate_key(id, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_rotations_are_serialised() {
    let logger = Arc::new(CapturingLogger::new());
    let kms = KeyManagementService::new(KeyStore::in_memory(), logger);
    kms.store_key(&[9u8; 32], "shared").await.unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let kms = kms.clone();
            tokio::spawn(async move { kms.rotate_key("shared", None).await.unwrap().key.to_vec() })
        })
        .collect();

    let mut keys = Vec::new();
    for task in tasks {
        keys.push(task.await.unwrap());
    }
    let current = kms.retrieve_key("shared").await.unwrap().to_vec();
    assert!(keys.contains(&current), "the stored key is one that a rotation returned");
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 16);
}

#[tokio::test]
async fn test_keys_survive_reopening_file_storage() {
    let dir = TempDir::new().unwrap();
    let logger = Arc::new(CapturingLogger::new());

    {
        let storage = FileStorage::builder().root(dir.path()).connect().await.unwrap();
        let kms = KeyManagementService::new(KeyStore::new(storage), logger.clone());
        kms.store_key(&[3u8; 32], "tenants/acme").await.unwrap();
        kms.store_key(&[4u8; 16], "session").await.unwrap();
    }

    let storage = FileStorage::builder().root(dir.path()).connect().await.unwrap();
    let kms = KeyManagementService::new(KeyStore::new(storage.clone()), logger);
    assert_eq!(kms.list_key_identifiers().await.unwrap(), ["session", "tenants_acme"]);
    assert_eq!(kms.retrieve_key("tenants/acme").await.unwrap().as_slice(), &[3u8; 32]);

    let rotated = kms.rotate_key("session", None).await.unwrap();
    assert_eq!(rotated.key.len(), 16);
    assert!(storage.exists("keys/session").await.unwrap());
}

#[tokio::test]
async fn test_provider_over_file_storage() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::builder().root(dir.path()).connect().await.unwrap();
    let logger = Arc::new(CapturingLogger::new());
    let config = ProviderConfig::builder().kind(ProviderKind::Native).build();
    let provider = CryptoProvider::new(config, storage.clone(), logger);

    provider.generate_key(32, "k1", KeyPurpose::Encryption, &opts()).await.unwrap();
    storage.store("d1", HELLO, bastion_storage::Metadata::new()).await.unwrap();

    let e1 = provider.encrypt("d1", "k1", &opts()).await.unwrap();
    let plain = provider.decrypt(&e1, None, &opts()).await.unwrap();
    assert_eq!(storage.retrieve(&plain).await.unwrap(), HELLO);
}

#[tokio::test]
async fn test_longest_key_identifier_round_trips_through_file_storage() {
    let dir = TempDir::new().unwrap();
    let long = "k".repeat(MAX_KEY_ID_LEN);

    {
        let storage = FileStorage::builder().root(dir.path()).connect().await.unwrap();
        let keys = KeyStore::new(storage);
        keys.store(&long, &[1u8; 32]).await.unwrap();
    }

    let storage = FileStorage::builder().root(dir.path()).connect().await.unwrap();
    let keys = KeyStore::new(storage);
    assert_eq!(keys.get(&long).await.unwrap().unwrap().as_slice(), &[1u8; 32]);
    assert_eq!(keys.list_identifiers().await.unwrap(), [long.clone()]);
    assert!(keys.delete(&long).await.unwrap());
    assert!(keys.list_identifiers().await.unwrap().is_empty());
}
