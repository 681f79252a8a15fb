//! Metadata keys written next to every object the engine stores.

use bastion_storage::Metadata;

pub const KIND: &str = "bastion.kind";
pub const ALGORITHM: &str = "bastion.algorithm";
pub const KEY_PURPOSE: &str = "bastion.key.purpose";
pub const KEY_MATERIAL: &str = "bastion.key.material";
pub const KEY_ROLE: &str = "bastion.key.role";
pub const KEY_FINGERPRINT: &str = "bastion.key.fingerprint";
pub const KEY_ID: &str = "bastion.key.id";
pub const DATA_ID: &str = "bastion.data.id";
pub const AAD_ID: &str = "bastion.aad.id";
pub const CREATED_AT: &str = "bastion.created_at";

/// Values of [`KIND`].
pub mod kind {
    pub const KEY: &str = "key";
    pub const CIPHERTEXT: &str = "ciphertext";
    pub const PASSWORD_CIPHERTEXT: &str = "password-ciphertext";
    pub const DIGEST: &str = "digest";
    pub const HMAC: &str = "hmac";
    pub const SIGNATURE: &str = "signature";
    pub const PLAINTEXT: &str = "plaintext";
}

/// Starts a metadata map with the object kind and creation timestamp.
pub(crate) fn record(kind: &str) -> Metadata {
    let mut meta = Metadata::new();
    meta.insert(KIND.to_owned(), kind.to_owned());
    meta.insert(CREATED_AT.to_owned(), chrono::Utc::now().to_rfc3339());
    meta
}

pub(crate) trait MetadataExt {
    fn with(self, key: &str, value: impl ToString) -> Self;
}

impl MetadataExt for Metadata {
    fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.insert(key.to_owned(), value.to_string());
        self
    }
}
