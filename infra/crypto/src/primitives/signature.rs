use crate::algorithm::SignatureAlgorithm;
use crate::error::CryptoError;
use crate::primitives::random;
use p256::ecdsa::signature::{Signer, Verifier};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use zeroize::Zeroizing;

/// Scalars outside the curve order are redrawn.
const MAX_SCALAR_DRAWS: usize = 8;

pub(crate) struct KeyPair {
    pub(crate) public: Vec<u8>,
    pub(crate) private: Zeroizing<Vec<u8>>,
}

/// Generates a key pair. Public keys are SEC1 uncompressed for ECDSA and the raw
/// 32-byte point for Ed25519; private keys are the raw scalar or seed.
pub(crate) fn generate(algorithm: SignatureAlgorithm) -> Result<KeyPair, CryptoError> {
    match algorithm {
        SignatureAlgorithm::EcdsaP256 => {
            let key = p256_signing_key()?;
            Ok(KeyPair {
                public: key.verifying_key().to_encoded_point(false).as_bytes().to_vec(),
                private: Zeroizing::new(key.to_bytes().to_vec()),
            })
        }
        SignatureAlgorithm::EcdsaP384 => {
            let key = draw_scalar(48, |bytes| p384::ecdsa::SigningKey::from_slice(bytes).ok())?;
            Ok(KeyPair {
                public: key.verifying_key().to_encoded_point(false).as_bytes().to_vec(),
                private: Zeroizing::new(key.to_bytes().to_vec()),
            })
        }
        SignatureAlgorithm::Ed25519 => {
            let seed = Zeroizing::new(random::array::<32>()?);
            let key = ed25519_dalek::SigningKey::from_bytes(&seed);
            Ok(KeyPair {
                public: key.verifying_key().to_bytes().to_vec(),
                private: Zeroizing::new(seed.to_vec()),
            })
        }
    }
}

pub(crate) fn p256_signing_key() -> Result<p256::ecdsa::SigningKey, CryptoError> {
    draw_scalar(32, |bytes| p256::ecdsa::SigningKey::from_slice(bytes).ok())
}

fn draw_scalar<K>(len: usize, parse: impl Fn(&[u8]) -> Option<K>) -> Result<K, CryptoError> {
    for _ in 0..MAX_SCALAR_DRAWS {
        let bytes = random::secret(len)?;
        if let Some(key) = parse(&bytes) {
            return Ok(key);
        }
    }
    Err(CryptoError::KeyGenerationFailed { message: "no valid scalar drawn".into(), context: None })
}

fn signing_failed(message: impl Into<Cow<'static, str>>) -> CryptoError {
    CryptoError::SigningFailed { message: message.into(), context: None }
}

fn bad_private_key(algorithm: SignatureAlgorithm) -> CryptoError {
    signing_failed(format!("malformed {algorithm} private key"))
}

pub(crate) fn sign(
    algorithm: SignatureAlgorithm,
    private: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    match algorithm {
        SignatureAlgorithm::EcdsaP256 => {
            let key = p256::ecdsa::SigningKey::from_slice(private)
                .map_err(|_| bad_private_key(algorithm))?;
            sign_p256(&key, data)
        }
        SignatureAlgorithm::EcdsaP384 => {
            let key = p384::ecdsa::SigningKey::from_slice(private)
                .map_err(|_| bad_private_key(algorithm))?;
            let sig: p384::ecdsa::Signature =
                key.try_sign(data).map_err(|e| signing_failed(e.to_string()))?;
            Ok(sig.to_bytes().to_vec())
        }
        SignatureAlgorithm::Ed25519 => {
            let seed: &[u8; 32] = private.try_into().map_err(|_| bad_private_key(algorithm))?;
            Ok(ed25519_dalek::SigningKey::from_bytes(seed).sign(data).to_bytes().to_vec())
        }
    }
}

pub(crate) fn sign_p256(
    key: &p256::ecdsa::SigningKey,
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let sig: p256::ecdsa::Signature =
        key.try_sign(data).map_err(|e| signing_failed(e.to_string()))?;
    Ok(sig.to_bytes().to_vec())
}

/// Verifies `signature` over `data`. A malformed or mismatching signature is `Ok(false)`;
/// only an unusable public key is an error.
pub(crate) fn verify(
    algorithm: SignatureAlgorithm,
    public: &[u8],
    data: &[u8],
    signature: &[u8],
) -> Result<bool, CryptoError> {
    let bad_key = || CryptoError::VerificationFailed {
        message: format!("malformed {algorithm} public key").into(),
        context: None,
    };
    Ok(match algorithm {
        SignatureAlgorithm::EcdsaP256 => {
            let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(public).map_err(|_| bad_key())?;
            p256::ecdsa::Signature::from_slice(signature)
                .is_ok_and(|sig| key.verify(data, &sig).is_ok())
        }
        SignatureAlgorithm::EcdsaP384 => {
            let key = p384::ecdsa::VerifyingKey::from_sec1_bytes(public).map_err(|_| bad_key())?;
            p384::ecdsa::Signature::from_slice(signature)
                .is_ok_and(|sig| key.verify(data, &sig).is_ok())
        }
        SignatureAlgorithm::Ed25519 => {
            let point: &[u8; 32] = public.try_into().map_err(|_| bad_key())?;
            let key = ed25519_dalek::VerifyingKey::from_bytes(point).map_err(|_| bad_key())?;
            ed25519_dalek::Signature::from_slice(signature)
                .is_ok_and(|sig| key.verify_strict(data, &sig).is_ok())
        }
    })
}

/// Hex SHA-256 of the encoded public key.
pub(crate) fn fingerprint(public: &[u8]) -> String {
    hex::encode(Sha256::digest(public))
}
