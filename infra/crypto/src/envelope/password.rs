use crate::error::CryptoError;
use crate::primitives::aead::{NONCE_LEN, TAG_LEN};

pub const PASSWORD_ENVELOPE_VERSION: u8 = 0x01;
pub const SALT_LEN: usize = 16;
pub const MIN_PASSWORD_ENVELOPE_LEN: usize = 1 + SALT_LEN + NONCE_LEN + 4;

/// PBKDF2 rounds used when the caller does not ask for more. Also the floor.
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 600_000;
/// Embedded counts above this are treated as corruption.
pub const MAX_PASSWORD_ITERATIONS: u32 = 10_000_000;

const SALT_AT: usize = 1;
const NONCE_AT: usize = SALT_AT + SALT_LEN;
const ITERATIONS_AT: usize = NONCE_AT + NONCE_LEN;

/// Self-contained password-derived envelope. The KDF parameters travel with the
/// ciphertext so the iteration count can be raised without breaking old blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordEnvelope {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub iterations: u32,
    /// `ciphertext ‖ tag`.
    pub sealed: Vec<u8>,
}

impl PasswordEnvelope {
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(MIN_PASSWORD_ENVELOPE_LEN + self.sealed.len());
        blob.push(PASSWORD_ENVELOPE_VERSION);
        blob.extend_from_slice(&self.salt);
        blob.extend_from_slice(&self.nonce);
        blob.extend_from_slice(&self.iterations.to_be_bytes());
        blob.extend_from_slice(&self.sealed);
        blob
    }

    /// # Errors
    /// [`CryptoError::DataCorrupted`] for a short blob, an unknown version, an iteration
    /// count of zero or above [`MAX_PASSWORD_ITERATIONS`], or a missing tag.
    pub fn decode(blob: &[u8]) -> Result<Self, CryptoError> {
        if blob.len() < MIN_PASSWORD_ENVELOPE_LEN {
            return Err(CryptoError::data_corrupted(format!(
                "password envelope is {} bytes, minimum is {MIN_PASSWORD_ENVELOPE_LEN}",
                blob.len()
            )));
        }
        if blob[0] != PASSWORD_ENVELOPE_VERSION {
            return Err(CryptoError::data_corrupted(format!(
                "unknown password envelope version {:#04x}",
                blob[0]
            )));
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&blob[SALT_AT..NONCE_AT]);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&blob[NONCE_AT..ITERATIONS_AT]);
        let mut iterations = [0u8; 4];
        iterations.copy_from_slice(&blob[ITERATIONS_AT..MIN_PASSWORD_ENVELOPE_LEN]);
        let iterations = u32::from_be_bytes(iterations);

        if iterations == 0 || iterations > MAX_PASSWORD_ITERATIONS {
            return Err(CryptoError::data_corrupted(format!(
                "implausible iteration count {iterations}"
            )));
        }
        let sealed = &blob[MIN_PASSWORD_ENVELOPE_LEN..];
        if sealed.len() < TAG_LEN {
            return Err(CryptoError::data_corrupted(
                "ciphertext is shorter than the authentication tag",
            ));
        }

        Ok(Self { salt, nonce, iterations, sealed: sealed.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn sample() -> PasswordEnvelope {
        PasswordEnvelope {
            salt: [1; SALT_LEN],
            nonce: [2; NONCE_LEN],
            iterations: 600_000,
            sealed: vec![3; 20],
        }
    }

    fn corrupted(blob: &[u8]) -> bool {
        PasswordEnvelope::decode(blob).is_err_and(|e| e.kind() == ErrorKind::DataCorrupted)
    }

    #[test]
    fn layout_is_fixed() {
        let blob = sample().encode();
        assert_eq!(blob[0], 0x01);
        assert_eq!(&blob[ITERATIONS_AT..MIN_PASSWORD_ENVELOPE_LEN], &600_000u32.to_be_bytes());
        assert_eq!(PasswordEnvelope::decode(&blob).unwrap(), sample());
    }

    #[test]
    fn structural_violations() {
        let blob = sample().encode();
        assert!(corrupted(&blob[..MIN_PASSWORD_ENVELOPE_LEN - 1]));
        assert!(corrupted(&blob[..MIN_PASSWORD_ENVELOPE_LEN]));

        let mut wrong_version = blob.clone();
        wrong_version[0] = 0x02;
        assert!(corrupted(&wrong_version));

        let mut zero_rounds = blob.clone();
        zero_rounds[ITERATIONS_AT..MIN_PASSWORD_ENVELOPE_LEN].copy_from_slice(&0u32.to_be_bytes());
        assert!(corrupted(&zero_rounds));

        let mut huge_rounds = blob;
        huge_rounds[ITERATIONS_AT..MIN_PASSWORD_ENVELOPE_LEN]
            .copy_from_slice(&(MAX_PASSWORD_ITERATIONS + 1).to_be_bytes());
        assert!(corrupted(&huge_rounds));
    }
}
