pub mod fixtures;

use bastion_crypto::envelope::{
    MIN_PASSWORD_ENVELOPE_LEN, MIN_SYMMETRIC_ENVELOPE_LEN, PasswordEnvelope,
};
use bastion_crypto::prelude::*;
use bastion_storage::SecureStorage;
use fixtures::*;

#[tokio::test]
async fn test_short_envelopes_fail_before_key_lookup() {
    let h = Harness::new(ProviderKind::Portable);
    for len in [0, 5, MIN_SYMMETRIC_ENVELOPE_LEN - 1, MIN_SYMMETRIC_ENVELOPE_LEN] {
        h.put("short", &vec![0u8; len]).await;
        let err = h.provider.decrypt("short", Some("never-created"), &opts()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataCorrupted, "len {len} with explicit key");
        let err = h.provider.decrypt("short", None, &opts()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataCorrupted, "len {len} with embedded key");
    }
}

#[tokio::test]
async fn test_truncated_ciphertext_is_corrupted() {
    let h = Harness::new(ProviderKind::Portable);
    h.key("k1").await;
    h.put("d1", b"").await;

    let options = EncryptionOptions::builder().embed_key_id(false).build();
    let e1 = h.provider.encrypt("d1", "k1", &options).await.unwrap();
    let len = h.read(&e1).await.len();
    assert_eq!(len, MIN_SYMMETRIC_ENVELOPE_LEN + 16, "empty plaintext still carries a tag");

    h.tamper(&e1, |blob| {
        blob.remove(20);
    })
    .await;
    let err = h.provider.decrypt(&e1, Some("k1"), &opts()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataCorrupted);
}

#[tokio::test]
async fn test_unknown_embedded_cipher_name_is_corrupted() {
    let h = Harness::new(ProviderKind::Portable);
    h.key("k1").await;
    h.put("d1", HELLO).await;
    let e1 = h.provider.encrypt("d1", "k1", &opts()).await.unwrap();

    let mut meta = h.storage.metadata(&e1).await.unwrap();
    meta.insert(bastion_crypto::metadata::ALGORITHM.to_owned(), "ROT13".to_owned());
    let blob = h.read(&e1).await;
    bastion_storage::SecureStorage::store(&h.storage, &e1, &blob, meta).await.unwrap();

    let err = h.provider.decrypt(&e1, None, &opts()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataCorrupted);
}

#[tokio::test]
async fn test_password_envelope_structure_is_checked_first() {
    let h = Harness::new(ProviderKind::Portable);

    h.put("short", &[0x01; MIN_PASSWORD_ENVELOPE_LEN - 1]).await;
    let err = h.provider.decrypt_with_password("short", "pw", &opts()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataCorrupted);

    let zero_rounds =
        PasswordEnvelope { salt: [1; 16], nonce: [2; 12], iterations: 0, sealed: vec![0; 16] };
    h.put("zero", &zero_rounds.encode()).await;
    let err = h.provider.decrypt_with_password("zero", "pw", &opts()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataCorrupted);

    let no_tag = PasswordEnvelope {
        salt: [1; 16],
        nonce: [2; 12],
        iterations: 600_000,
        sealed: vec![0; 15],
    };
    h.put("no-tag", &no_tag.encode()).await;
    let err = h.provider.decrypt_with_password("no-tag", "pw", &opts()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataCorrupted);
}

#[tokio::test]
async fn test_password_envelope_is_not_a_symmetric_one() {
    let h = Harness::new(ProviderKind::Portable);
    h.key("k1").await;
    h.put("d1", HELLO).await;

    let e1 = h.provider.encrypt("d1", "k1", &opts()).await.unwrap();
    let err = h.provider.decrypt_with_password(&e1, "pw", &opts()).await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::DataCorrupted | ErrorKind::AuthenticationFailed));
}
