use bastion_storage::*;
use tempfile::TempDir;

async fn connect(temp: &TempDir) -> FileStorage {
    FileStorage::builder().root(temp.path().join("vault")).connect().await.unwrap()
}

fn meta(kind: &str) -> Metadata {
    let mut meta = Metadata::new();
    meta.insert("bastion.kind".to_owned(), kind.to_owned());
    meta
}

#[tokio::test]
async fn test_store_retrieve_roundtrip_with_metadata() {
    let temp = TempDir::new().unwrap();
    let storage = connect(&temp).await;

    storage.store("data/report", b"hello world", meta("plaintext")).await.unwrap();
    assert!(storage.exists("data/report").await.unwrap());
    assert_eq!(storage.retrieve("data/report").await.unwrap(), b"hello world");
    assert_eq!(storage.metadata("data/report").await.unwrap(), meta("plaintext"));
}

#[tokio::test]
async fn test_overwrite_replaces_data_and_metadata_together() {
    let temp = TempDir::new().unwrap();
    let storage = connect(&temp).await;

    storage.store("keys/a", b"old", meta("key")).await.unwrap();
    storage.store("keys/a", b"new", meta("rotated")).await.unwrap();

    assert_eq!(storage.retrieve("keys/a").await.unwrap(), b"new");
    assert_eq!(storage.metadata("keys/a").await.unwrap(), meta("rotated"));
}

#[tokio::test]
async fn test_traversal_identifiers_stay_in_sandbox() {
    let temp = TempDir::new().unwrap();
    let storage = connect(&temp).await;

    for id in ["../../etc/passwd", "/abs/path", "a\\..\\b", "c:/windows"] {
        let path = storage.resolve(id).unwrap();
        assert!(path.starts_with(storage.root()), "{id} escaped to {}", path.display());
        storage.store(id, b"x", Metadata::new()).await.unwrap();
    }

    let mut listed = storage.list("").await.unwrap();
    listed.sort();
    assert_eq!(listed, vec!["../../etc/passwd", "/abs/path", "a\\..\\b", "c:/windows"]);
}

#[tokio::test]
async fn test_list_filters_by_prefix_and_survives_reconnect() {
    let temp = TempDir::new().unwrap();
    {
        let storage = connect(&temp).await;
        storage.store("keys/one", b"1", Metadata::new()).await.unwrap();
        storage.store("keys/two", b"2", Metadata::new()).await.unwrap();
        storage.store("envelopes/x", b"3", Metadata::new()).await.unwrap();
    }

    let storage = connect(&temp).await;
    assert_eq!(storage.list("keys/").await.unwrap(), vec!["keys/one", "keys/two"]);
    assert_eq!(storage.retrieve("keys/two").await.unwrap(), b"2");
}

#[tokio::test]
async fn test_delete_and_exists() {
    let temp = TempDir::new().unwrap();
    let storage = connect(&temp).await;

    storage.store("tmp/file", b"x", Metadata::new()).await.unwrap();
    storage.delete("tmp/file").await.unwrap();
    assert!(!storage.exists("tmp/file").await.unwrap());

    let err = storage.delete("tmp/file").await.expect_err("second delete");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_missing_object_is_not_found() {
    let temp = TempDir::new().unwrap();
    let storage = connect(&temp).await;

    match storage.retrieve("missing").await.expect_err("expected error") {
        StorageError::NotFound { .. } => {},
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_identifiers_rejected() {
    let temp = TempDir::new().unwrap();
    let storage = connect(&temp).await;

    let too_long = "k".repeat(MAX_IDENTIFIER_LEN + 1);
    for id in ["", too_long.as_str(), "nul\0byte"] {
        let err = storage.store(id, b"x", Metadata::new()).await.expect_err("must be rejected");
        assert!(matches!(err, StorageError::InvalidIdentifier { .. }), "{id:?}: {err}");
    }
}

#[tokio::test]
async fn test_long_identifiers_are_stored_and_listed() {
    let temp = TempDir::new().unwrap();
    let long = format!("keys/{}", "a".repeat(255));
    {
        let storage = connect(&temp).await;
        storage.store(&long, b"secret", meta("key")).await.unwrap();
        storage.store("keys/short", b"s", Metadata::new()).await.unwrap();
        assert!(storage.exists(&long).await.unwrap());
    }

    let storage = connect(&temp).await;
    assert_eq!(storage.retrieve(&long).await.unwrap(), b"secret");
    assert_eq!(storage.metadata(&long).await.unwrap(), meta("key"));
    assert_eq!(storage.list("keys/").await.unwrap(), vec![long.clone(), "keys/short".to_owned()]);

    storage.delete(&long).await.unwrap();
    assert_eq!(storage.list("keys/").await.unwrap(), ["keys/short"]);
}

#[tokio::test]
async fn test_record_under_foreign_name_is_corrupted() {
    let temp = TempDir::new().unwrap();
    let storage = connect(&temp).await;

    storage.store("a", b"one", Metadata::new()).await.unwrap();
    std::fs::copy(storage.resolve("a").unwrap(), storage.resolve("b").unwrap()).unwrap();

    let err = storage.retrieve("b").await.expect_err("copied record");
    assert!(matches!(err, StorageError::Corrupted { .. }));
}

#[tokio::test]
async fn test_truncated_record_reports_corruption() {
    let temp = TempDir::new().unwrap();
    let storage = connect(&temp).await;

    storage.store("victim", b"payload", meta("plaintext")).await.unwrap();
    std::fs::write(storage.resolve("victim").unwrap(), [0, 0, 0]).unwrap();

    let err = storage.retrieve("victim").await.expect_err("corrupt record");
    assert!(matches!(err, StorageError::Corrupted { .. }));
}

#[tokio::test]
async fn test_connect_without_create_requires_root() {
    let temp = TempDir::new().unwrap();
    let err = FileStorage::builder()
        .root(temp.path().join("absent"))
        .create(false)
        .connect()
        .await
        .expect_err("root must exist");
    assert!(matches!(err, StorageError::Io { .. }));
}

#[tokio::test]
async fn test_shared_arc_handle() {
    let storage = std::sync::Arc::new(MemoryStorage::new());
    storage.store("a", b"b", Metadata::new()).await.unwrap();
    assert_eq!(SecureStorage::retrieve(&storage, "a").await.unwrap(), b"b");
}
