//! Algorithm identifiers. The `Display`/`FromStr` forms are what gets persisted in metadata.

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// AEAD ciphers. Both use 256-bit keys, 96-bit nonces and 128-bit tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
pub enum CipherAlgorithm {
    #[strum(serialize = "AES-256-GCM")]
    Aes256Gcm,
    #[strum(serialize = "ChaCha20-Poly1305")]
    ChaCha20Poly1305,
}

impl CipherAlgorithm {
    pub const KEY_LEN: usize = 32;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
pub enum HashAlgorithm {
    #[default]
    #[strum(serialize = "SHA-256")]
    Sha256,
    #[strum(serialize = "SHA-384")]
    Sha384,
    #[strum(serialize = "SHA-512")]
    Sha512,
}

impl HashAlgorithm {
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

/// Signature families: a hardware-capable curve, a high-assurance curve and an Edwards scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
pub enum SignatureAlgorithm {
    #[strum(serialize = "ECDSA-P256")]
    EcdsaP256,
    #[strum(serialize = "ECDSA-P384")]
    EcdsaP384,
    #[strum(serialize = "Ed25519")]
    Ed25519,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum KeyPurpose {
    Encryption,
    Signing,
    Derivation,
    Wrapping,
    #[default]
    General,
}

/// Half of an asymmetric key pair. Symmetric keys carry no role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum KeyRole {
    Public,
    Private,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn persisted_names_parse_back() {
        for alg in CipherAlgorithm::iter() {
            assert_eq!(CipherAlgorithm::from_str(alg.as_ref()).unwrap(), alg);
        }
        for alg in SignatureAlgorithm::iter() {
            assert_eq!(SignatureAlgorithm::from_str(&alg.to_string()).unwrap(), alg);
        }
        assert_eq!(KeyPurpose::from_str("wrapping").unwrap(), KeyPurpose::Wrapping);
        assert_eq!(HashAlgorithm::Sha384.to_string(), "SHA-384");
    }

    #[test]
    fn digest_sizes() {
        let sizes: Vec<usize> = HashAlgorithm::iter().map(HashAlgorithm::output_len).collect();
        assert_eq!(sizes, [32, 48, 64]);
    }
}
