use crate::error::CryptoError;
use crate::keys::{MAX_KEY_ID_LEN, is_sanitized};
use crate::primitives::aead::{NONCE_LEN, TAG_LEN};

/// Nonce plus the key id length byte.
pub const MIN_SYMMETRIC_ENVELOPE_LEN: usize = NONCE_LEN + 1;

/// Key-by-reference AEAD envelope.
///
/// ```rust
/// use bastion_crypto::envelope::SymmetricEnvelope;
///
/// let envelope = SymmetricEnvelope::new([9u8; 12], vec![0xAA; 20], Some("k1".to_owned()));
/// let blob = envelope.encode()?;
/// assert_eq!(&blob[blob.len() - 3..], &[2, b'k', b'1']);
///
/// let decoded = SymmetricEnvelope::decode_for_key(&blob, "k1")?;
/// assert_eq!(decoded, envelope);
/// # Ok::<(), bastion_crypto::CryptoError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetricEnvelope {
    pub nonce: [u8; NONCE_LEN],
    /// `ciphertext ‖ tag`.
    pub sealed: Vec<u8>,
    pub key_id: Option<String>,
}

impl SymmetricEnvelope {
    #[must_use]
    pub const fn new(nonce: [u8; NONCE_LEN], sealed: Vec<u8>, key_id: Option<String>) -> Self {
        Self { nonce, sealed, key_id }
    }

    /// # Errors
    /// [`CryptoError::InvalidInput`] when the key id does not fit the one-byte length.
    pub fn encode(&self) -> Result<Vec<u8>, CryptoError> {
        let id = self.key_id.as_deref().unwrap_or_default().as_bytes();
        let id_len = u8::try_from(id.len())
            .map_err(|_| CryptoError::invalid_input("embedded key identifier exceeds 255 bytes"))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + self.sealed.len() + 1 + id.len());
        blob.extend_from_slice(&self.nonce);
        blob.extend_from_slice(&self.sealed);
        blob.push(id_len);
        blob.extend_from_slice(id);
        Ok(blob)
    }

    /// Decodes a blob whose key is already known to the caller.
    ///
    /// The trailer must be `[len][key_id]` or the empty `[0]`. A trailer naming a
    /// different key is stripped; the caller's key still decides.
    ///
    /// # Errors
    /// [`CryptoError::DataCorrupted`] on any structural violation.
    pub fn decode_for_key(blob: &[u8], key_id: &str) -> Result<Self, CryptoError> {
        check_min_len(blob)?;

        let id = key_id.as_bytes();
        if id.len() <= MAX_KEY_ID_LEN && blob.len() > NONCE_LEN + id.len() {
            let len_pos = blob.len() - 1 - id.len();
            if usize::from(blob[len_pos]) == id.len() && &blob[len_pos + 1..] == id {
                return split(blob, len_pos, Some(key_id.to_owned()));
            }
        }
        if blob[blob.len() - 1] == 0 {
            return split(blob, blob.len() - 1, None);
        }
        Self::candidates(blob)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                CryptoError::data_corrupted("envelope trailer does not match the key identifier")
            })
    }

    /// Every structurally valid reading of a self-describing blob, longest key id first.
    ///
    /// A trailer is a candidate when the byte `L` positions from the end equals `L` and the
    /// last `L` bytes form a sanitised identifier. Ciphertext bytes can mimic a shorter
    /// trailer, so callers try candidates in order.
    ///
    /// # Errors
    /// [`CryptoError::DataCorrupted`] when the blob is too short or carries no candidate.
    pub fn candidates(blob: &[u8]) -> Result<Vec<Self>, CryptoError> {
        check_min_len(blob)?;

        let max_len = MAX_KEY_ID_LEN.min(blob.len() - MIN_SYMMETRIC_ENVELOPE_LEN);
        let found: Vec<Self> = (1..=max_len)
            .rev()
            .filter_map(|len| {
                let len_pos = blob.len() - 1 - len;
                if usize::from(blob[len_pos]) != len || len_pos - NONCE_LEN < TAG_LEN {
                    return None;
                }
                let id =
                    std::str::from_utf8(&blob[len_pos + 1..]).ok().filter(|id| is_sanitized(id))?;
                split(blob, len_pos, Some(id.to_owned())).ok()
            })
            .collect();

        if found.is_empty() {
            return Err(CryptoError::data_corrupted("envelope carries no embedded key identifier"));
        }
        Ok(found)
    }
}

fn check_min_len(blob: &[u8]) -> Result<(), CryptoError> {
    if blob.len() < MIN_SYMMETRIC_ENVELOPE_LEN {
        return Err(CryptoError::data_corrupted(format!(
            "envelope is {} bytes, minimum is {MIN_SYMMETRIC_ENVELOPE_LEN}",
            blob.len()
        )));
    }
    Ok(())
}

fn split(
    blob: &[u8],
    len_pos: usize,
    key_id: Option<String>,
) -> Result<SymmetricEnvelope, CryptoError> {
    let sealed = &blob[NONCE_LEN..len_pos];
    if sealed.len() < TAG_LEN {
        return Err(CryptoError::data_corrupted(
            "ciphertext is shorter than the authentication tag",
        ));
    }
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&blob[..NONCE_LEN]);
    Ok(SymmetricEnvelope { nonce, sealed: sealed.to_vec(), key_id })
}
