use crate::algorithm::{CipherAlgorithm, HashAlgorithm};
use typed_builder::TypedBuilder;

/// Per-call knobs shared by every engine operation. Unset fields fall back to the
/// provider's defaults.
///
/// ```rust
/// use bastion_crypto::{CipherAlgorithm, EncryptionOptions};
///
/// let options = EncryptionOptions::builder()
///     .algorithm(CipherAlgorithm::ChaCha20Poly1305)
///     .aad_id("headers/request-42")
///     .output_id("envelopes/report")
///     .build();
/// assert!(options.embed_key_id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct EncryptionOptions {
    /// Forces a cipher instead of the provider's optimal one.
    #[builder(default, setter(strip_option))]
    pub algorithm: Option<CipherAlgorithm>,

    /// Digest for `hash`, HMAC and HKDF. Defaults to SHA-256.
    #[builder(default, setter(strip_option))]
    pub hash_algorithm: Option<HashAlgorithm>,

    /// Identifier of stored bytes bound as additional authenticated data.
    #[builder(default, setter(strip_option, into))]
    pub aad_id: Option<String>,

    /// Writes the key identifier into the symmetric envelope trailer.
    #[builder(default = true)]
    pub embed_key_id: bool,

    /// Requests key generation inside the hardware boundary, when one is attached.
    #[builder(default)]
    pub use_hardware: bool,

    /// Identifier for the produced object; a fresh one is generated otherwise.
    #[builder(default, setter(strip_option, into))]
    pub output_id: Option<String>,

    /// PBKDF2 rounds for `encrypt_with_password`; never below the provider minimum.
    #[builder(default, setter(strip_option))]
    pub iterations: Option<u32>,
}

impl Default for EncryptionOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl EncryptionOptions {
    pub(crate) fn hash_or_default(&self) -> HashAlgorithm {
        self.hash_algorithm.unwrap_or_default()
    }
}
