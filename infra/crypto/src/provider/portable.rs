//! Constant-time software provider with ChaCha20-Poly1305 as the default cipher.

use super::{Capabilities, ProviderKind};
use crate::algorithm::{CipherAlgorithm, HashAlgorithm, SignatureAlgorithm};

const CIPHERS: &[CipherAlgorithm] =
    &[CipherAlgorithm::ChaCha20Poly1305, CipherAlgorithm::Aes256Gcm];
const HASHES: &[HashAlgorithm] =
    &[HashAlgorithm::Sha256, HashAlgorithm::Sha384, HashAlgorithm::Sha512];
const SIGNATURES: &[SignatureAlgorithm] =
    &[SignatureAlgorithm::Ed25519, SignatureAlgorithm::EcdsaP256, SignatureAlgorithm::EcdsaP384];

pub(crate) const fn capabilities() -> Capabilities {
    Capabilities {
        kind: ProviderKind::Portable,
        ciphers: CIPHERS,
        default_cipher: CipherAlgorithm::ChaCha20Poly1305,
        hashes: HASHES,
        signatures: SIGNATURES,
        hardware_backed: false,
        aes_acceleration: false,
    }
}
