//! Accelerated provider: AES-256-GCM on CPUs with AES instructions, every hash and
//! signature family, and the only provider that attaches a hardware keyring.

use super::{Capabilities, ProviderKind};
use crate::algorithm::{CipherAlgorithm, HashAlgorithm, SignatureAlgorithm};

const CIPHERS: &[CipherAlgorithm] =
    &[CipherAlgorithm::Aes256Gcm, CipherAlgorithm::ChaCha20Poly1305];
const HASHES: &[HashAlgorithm] =
    &[HashAlgorithm::Sha256, HashAlgorithm::Sha384, HashAlgorithm::Sha512];
const SIGNATURES: &[SignatureAlgorithm] =
    &[SignatureAlgorithm::EcdsaP256, SignatureAlgorithm::EcdsaP384, SignatureAlgorithm::Ed25519];

pub(crate) fn capabilities(hardware_backed: bool) -> Capabilities {
    let aes_acceleration = has_aes_instructions();
    Capabilities {
        kind: ProviderKind::Native,
        ciphers: CIPHERS,
        default_cipher: preferred_cipher(aes_acceleration),
        hashes: HASHES,
        signatures: SIGNATURES,
        hardware_backed,
        aes_acceleration,
    }
}

const fn preferred_cipher(aes_acceleration: bool) -> CipherAlgorithm {
    if aes_acceleration {
        CipherAlgorithm::Aes256Gcm
    } else {
        CipherAlgorithm::ChaCha20Poly1305
    }
}

/// Runtime CPU feature detection.
pub fn has_aes_instructions() -> bool {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        std::arch::is_x86_feature_detected!("aes")
            && std::arch::is_x86_feature_detected!("pclmulqdq")
    }
    #[cfg(target_arch = "aarch64")]
    {
        std::arch::is_aarch64_feature_detected!("aes")
    }
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cipher_follows_the_cpu() {
        let caps = capabilities(false);
        assert_eq!(caps.default_cipher, preferred_cipher(has_aes_instructions()));
        assert_eq!(preferred_cipher(false), CipherAlgorithm::ChaCha20Poly1305);
        assert!(caps.supports_signature(SignatureAlgorithm::EcdsaP384));
        assert!(capabilities(true).hardware_backed);
    }
}
