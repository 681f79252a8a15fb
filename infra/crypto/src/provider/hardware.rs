use crate::algorithm::CipherAlgorithm;
use crate::error::CryptoError;
use crate::keys::HardwareRef;
use crate::primitives::aead::NONCE_LEN;
use crate::primitives::{aead, random, signature};
use bastion_kernel::safe_nanoid;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

enum Slot {
    Symmetric(Zeroizing<[u8; 32]>),
    P256(p256::ecdsa::SigningKey),
}

/// Key slots behind an opaque-token boundary.
///
/// Material generated here never leaves the keyring; callers hold a [`HardwareRef`] and
/// ask the keyring to seal, open or sign on their behalf. Slots live in process memory,
/// so references do not survive a restart.
#[derive(Clone, Default)]
pub struct HardwareKeyring {
    slots: Arc<RwLock<FxHashMap<String, Slot>>>,
}

impl fmt::Debug for HardwareKeyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HardwareKeyring").field("slots", &self.len()).finish()
    }
}

impl HardwareKeyring {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    pub fn contains(&self, reference: &HardwareRef) -> bool {
        self.slots.read().contains_key(reference.token())
    }

    /// Drops a slot. Returns whether it existed.
    pub fn destroy(&self, reference: &HardwareRef) -> bool {
        self.slots.write().remove(reference.token()).is_some()
    }

    fn insert(&self, slot: Slot) -> HardwareRef {
        let token = format!("hw_{}", safe_nanoid!(24));
        self.slots.write().insert(token.clone(), slot);
        debug!("Hardware slot allocated");
        HardwareRef(token)
    }

    fn missing() -> CryptoError {
        CryptoError::key_not_found("hardware key reference is not resident")
    }

    pub(crate) fn generate_symmetric(&self) -> Result<HardwareRef, CryptoError> {
        let key = Zeroizing::new(random::array::<32>()?);
        Ok(self.insert(Slot::Symmetric(key)))
    }

    /// Returns the reference and the SEC1 uncompressed public key.
    pub(crate) fn generate_p256(&self) -> Result<(HardwareRef, Vec<u8>), CryptoError> {
        let key = signature::p256_signing_key()?;
        let public = key.verifying_key().to_encoded_point(false).as_bytes().to_vec();
        Ok((self.insert(Slot::P256(key)), public))
    }

    pub(crate) fn seal(
        &self,
        reference: &HardwareRef,
        cipher: CipherAlgorithm,
        nonce: &[u8; NONCE_LEN],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        match self.slots.read().get(reference.token()) {
            Some(Slot::Symmetric(key)) => aead::seal(cipher, &key[..], nonce, plaintext, aad),
            Some(Slot::P256(_)) => {
                Err(CryptoError::unsupported_operation("signing key cannot encrypt"))
            },
            None => Err(Self::missing()),
        }
    }

    pub(crate) fn open(
        &self,
        reference: &HardwareRef,
        cipher: CipherAlgorithm,
        nonce: &[u8; NONCE_LEN],
        sealed: &[u8],
        aad: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        match self.slots.read().get(reference.token()) {
            Some(Slot::Symmetric(key)) => aead::open(cipher, &key[..], nonce, sealed, aad),
            Some(Slot::P256(_)) => {
                Err(CryptoError::unsupported_operation("signing key cannot decrypt"))
            },
            None => Err(Self::missing()),
        }
    }

    pub(crate) fn sign(
        &self,
        reference: &HardwareRef,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        match self.slots.read().get(reference.token()) {
            Some(Slot::P256(key)) => signature::sign_p256(key, data),
            Some(Slot::Symmetric(_)) => {
                Err(CryptoError::unsupported_operation("encryption key cannot sign"))
            },
            None => Err(Self::missing()),
        }
    }
}
