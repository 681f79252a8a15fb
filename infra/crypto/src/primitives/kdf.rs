use crate::algorithm::HashAlgorithm;
use crate::error::CryptoError;
use hkdf::Hkdf;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

pub(crate) const PBKDF2_KEY_LEN: usize = 32;

macro_rules! hkdf_with {
    ($hash:ty, $ikm:expr, $salt:expr, $info:expr, $okm:expr) => {
        Hkdf::<$hash>::new($salt, $ikm).expand($info, $okm)
    };
}

/// HKDF extract-and-expand. `salt = None` uses the all-zero salt of RFC 5869.
///
/// Output is capped at 255 hash blocks.
pub(crate) fn hkdf(
    algorithm: HashAlgorithm,
    ikm: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
    length: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let limit = 255 * algorithm.output_len();
    if length > limit {
        return Err(CryptoError::KeyDerivationFailed {
            message: format!("{length} bytes exceeds the HKDF-{algorithm} limit of {limit}").into(),
            context: None,
        });
    }

    let mut okm = Zeroizing::new(vec![0u8; length]);
    let expanded = match algorithm {
        HashAlgorithm::Sha256 => hkdf_with!(Sha256, ikm, salt, info, &mut okm),
        HashAlgorithm::Sha384 => hkdf_with!(Sha384, ikm, salt, info, &mut okm),
        HashAlgorithm::Sha512 => hkdf_with!(Sha512, ikm, salt, info, &mut okm),
    };
    expanded.map_err(|e| CryptoError::KeyDerivationFailed {
        message: e.to_string().into(),
        context: Some("HKDF expand".into()),
    })?;
    Ok(okm)
}

/// PBKDF2-HMAC-SHA256 into an AES-256 key. CPU bound; call from the blocking pool.
pub(crate) fn pbkdf2_sha256(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Zeroizing<[u8; PBKDF2_KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; PBKDF2_KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key[..]);
    key
}
