//! Storage layer for Bastion.
//!
//! Everything the crypto engine touches (keys, plaintexts, envelopes, digests, signatures)
//! lives behind the [`SecureStorage`] contract and is addressed by string identifiers.
//! Each object carries a small string [`Metadata`] map, written together with the bytes.
//!
//! # Backends
//!
//! - **[`MemoryStorage`]**: process-local map; bytes are zeroized on overwrite and delete.
//! - **[`FileStorage`]**: durable sandboxed directory with atomic writes (unique temp file +
//!   `fsync` + `rename`), sharded file names (hex for short identifiers, SHA-256 digest
//!   for long ones) and self-healing of orphaned temp files on connect.
//!
//! ```rust
//! use bastion_storage::{MemoryStorage, Metadata, SecureStorage, StorageError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), StorageError> {
//! let storage = MemoryStorage::new();
//!
//! let mut metadata = Metadata::new();
//! metadata.insert("bastion.kind".to_owned(), "plaintext".to_owned());
//! storage.store("data/report", b"quarterly numbers", metadata).await?;
//!
//! assert!(storage.exists("data/report").await?);
//! assert_eq!(storage.metadata("data/report").await?["bastion.kind"], "plaintext");
//! # Ok(())
//! # }
//! ```

mod builder;
mod contract;
mod engine;
mod error;
mod maintenance;
mod memory;
mod record;
mod security;

pub use builder::FileStorageBuilder;
pub use contract::{MAX_IDENTIFIER_LEN, Metadata, SecureStorage, validate_identifier};
pub use engine::FileStorage;
pub use error::{StorageError, StorageErrorExt};
pub use memory::MemoryStorage;
