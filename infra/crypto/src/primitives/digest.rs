use crate::algorithm::HashAlgorithm;
use crate::error::CryptoError;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha384, Sha512};

pub(crate) fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
        HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
    }
}

macro_rules! hmac_with {
    ($hash:ty, $key:expr, $data:expr) => {{
        let mut mac = <Hmac<$hash> as Mac>::new_from_slice($key)
            .map_err(|_| CryptoError::invalid_input("HMAC key rejected"))?;
        mac.update($data);
        mac.finalize().into_bytes().to_vec()
    }};
}

pub(crate) fn hmac(
    algorithm: HashAlgorithm,
    key: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    Ok(match algorithm {
        HashAlgorithm::Sha256 => hmac_with!(Sha256, key, data),
        HashAlgorithm::Sha384 => hmac_with!(Sha384, key, data),
        HashAlgorithm::Sha512 => hmac_with!(Sha512, key, data),
    })
}

/// Compares two buffers without an early exit on the first differing byte.
///
/// Unequal lengths return `false` before any content is read; lengths are not secret here.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y));
    std::hint::black_box(diff) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn sha256_known_answer() {
        assert_eq!(
            digest(HashAlgorithm::Sha256, b"abc"),
            hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        assert_eq!(digest(HashAlgorithm::Sha512, b"").len(), 64);
    }

    #[test]
    fn hmac_sha256_rfc4231_case_2() {
        let mac = hmac(HashAlgorithm::Sha256, b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(mac, hex!("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"));
    }

    #[test]
    fn comparison_rules() {
        assert!(constant_time_eq(b"same", b"same"));
        assert!(!constant_time_eq(b"same", b"samf"));
        assert!(!constant_time_eq(b"same", b"sam"));
        assert!(constant_time_eq(b"", b""));
    }
}
