//! Minimal fallback: one cipher, two digests, two signature families.

use super::{Capabilities, ProviderKind};
use crate::algorithm::{CipherAlgorithm, HashAlgorithm, SignatureAlgorithm};

const CIPHERS: &[CipherAlgorithm] = &[CipherAlgorithm::Aes256Gcm];
const HASHES: &[HashAlgorithm] = &[HashAlgorithm::Sha256, HashAlgorithm::Sha512];
const SIGNATURES: &[SignatureAlgorithm] =
    &[SignatureAlgorithm::Ed25519, SignatureAlgorithm::EcdsaP256];

pub(crate) const fn capabilities() -> Capabilities {
    Capabilities {
        kind: ProviderKind::Baseline,
        ciphers: CIPHERS,
        default_cipher: CipherAlgorithm::Aes256Gcm,
        hashes: HASHES,
        signatures: SIGNATURES,
        hardware_backed: false,
        aes_acceleration: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_assurance_curve_is_absent() {
        let caps = capabilities();
        assert!(!caps.supports_signature(SignatureAlgorithm::EcdsaP384));
        assert!(!caps.supports_cipher(CipherAlgorithm::ChaCha20Poly1305));
        assert!(!caps.supports_hash(HashAlgorithm::Sha384));
    }
}
