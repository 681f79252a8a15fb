use crate::algorithm::CipherAlgorithm;
use crate::error::CryptoError;
use aead::{Aead, KeyInit, Nonce, Payload};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::ChaCha20Poly1305;
use zeroize::Zeroizing;

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Encrypts `plaintext`, returning `ciphertext ‖ tag`.
pub(crate) fn seal(
    algorithm: CipherAlgorithm,
    key: &[u8],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    match algorithm {
        CipherAlgorithm::Aes256Gcm => seal_with::<Aes256Gcm>(key, nonce, plaintext, aad),
        CipherAlgorithm::ChaCha20Poly1305 => {
            seal_with::<ChaCha20Poly1305>(key, nonce, plaintext, aad)
        },
    }
}

/// Decrypts `ciphertext ‖ tag`. A tag mismatch is [`CryptoError::AuthenticationFailed`].
pub(crate) fn open(
    algorithm: CipherAlgorithm,
    key: &[u8],
    nonce: &[u8; NONCE_LEN],
    sealed: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    match algorithm {
        CipherAlgorithm::Aes256Gcm => open_with::<Aes256Gcm>(key, nonce, sealed, aad),
        CipherAlgorithm::ChaCha20Poly1305 => open_with::<ChaCha20Poly1305>(key, nonce, sealed, aad),
    }
}

fn seal_with<C: Aead + KeyInit>(
    key: &[u8],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = C::new_from_slice(key).map_err(|_| CryptoError::EncryptionFailed {
        message: bad_key_length(key).into(),
        context: None,
    })?;
    cipher.encrypt(Nonce::<C>::from_slice(nonce), Payload { msg: plaintext, aad }).map_err(|_| {
        CryptoError::EncryptionFailed { message: "AEAD seal failed".into(), context: None }
    })
}

fn open_with<C: Aead + KeyInit>(
    key: &[u8],
    nonce: &[u8; NONCE_LEN],
    sealed: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let cipher = C::new_from_slice(key).map_err(|_| CryptoError::DecryptionFailed {
        message: bad_key_length(key).into(),
        context: None,
    })?;
    cipher
        .decrypt(Nonce::<C>::from_slice(nonce), Payload { msg: sealed, aad })
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::authentication_failed("authentication tag mismatch"))
}

fn bad_key_length(key: &[u8]) -> String {
    format!("key must be {} bytes, got {}", CipherAlgorithm::KEY_LEN, key.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use strum::IntoEnumIterator;

    const KEY: [u8; 32] = [7u8; 32];
    const NONCE: [u8; NONCE_LEN] = [1u8; NONCE_LEN];

    #[test]
    fn both_ciphers_round_trip_with_aad() {
        for alg in CipherAlgorithm::iter() {
            let sealed = seal(alg, &KEY, &NONCE, b"payload", b"header").unwrap();
            assert_eq!(sealed.len(), 7 + TAG_LEN);
            let opened = open(alg, &KEY, &NONCE, &sealed, b"header").unwrap();
            assert_eq!(opened.as_slice(), b"payload");

            let err = open(alg, &KEY, &NONCE, &sealed, b"other").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        }
    }

    #[test]
    fn wrong_key_length_is_mapped() {
        let err = seal(CipherAlgorithm::Aes256Gcm, &[0u8; 16], &NONCE, b"x", b"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncryptionFailed);
        let short_key = [0u8; 31];
        let err = open(CipherAlgorithm::ChaCha20Poly1305, &short_key, &NONCE, &[0u8; 20], b"");
        let err = err.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecryptionFailed);
    }

    #[test]
    fn ciphers_are_not_interchangeable() {
        let sealed = seal(CipherAlgorithm::Aes256Gcm, &KEY, &NONCE, b"payload", b"").unwrap();
        assert!(open(CipherAlgorithm::ChaCha20Poly1305, &KEY, &NONCE, &sealed, b"").is_err());
    }
}
