use crate::algorithm::{KeyPurpose, KeyRole};
use std::fmt;
use zeroize::Zeroizing;

/// Opaque handle to a key held inside a hardware boundary.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HardwareRef(pub(crate) String);

impl HardwareRef {
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HardwareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HardwareRef").field(&"<opaque>").finish()
    }
}

/// What the key store holds for an identifier.
#[derive(Clone)]
pub enum KeyMaterial {
    Raw(Zeroizing<Vec<u8>>),
    Hardware(HardwareRef),
}

impl KeyMaterial {
    pub fn raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Raw(Zeroizing::new(bytes.into()))
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Raw(_) => "raw",
            Self::Hardware(_) => "hardware",
        }
    }

    pub const fn is_hardware(&self) -> bool {
        matches!(self, Self::Hardware(_))
    }

    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            Self::Raw(bytes) => Some(bytes),
            Self::Hardware(_) => None,
        }
    }

    pub(crate) fn stored_bytes(&self) -> &[u8] {
        match self {
            Self::Raw(bytes) => bytes,
            Self::Hardware(reference) => reference.0.as_bytes(),
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(bytes) => f.debug_struct("Raw").field("len", &bytes.len()).finish(),
            Self::Hardware(reference) => reference.fmt(f),
        }
    }
}

/// Descriptive attributes persisted as metadata next to the key bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyAttributes {
    pub purpose: KeyPurpose,
    /// Signature family for key pair halves.
    pub algorithm: Option<String>,
    pub role: Option<KeyRole>,
    /// Hex SHA-256 of the public half, recorded on both halves of a pair.
    pub fingerprint: Option<String>,
}

impl KeyAttributes {
    #[must_use]
    pub fn new(purpose: KeyPurpose) -> Self {
        Self { purpose, ..Self::default() }
    }

    #[must_use]
    pub fn algorithm(mut self, algorithm: impl ToString) -> Self {
        self.algorithm = Some(algorithm.to_string());
        self
    }

    #[must_use]
    pub const fn role(mut self, role: KeyRole) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }
}

/// A key as read back from the store.
#[derive(Debug, Clone)]
pub struct KeyEntry {
    pub id: String,
    pub material: KeyMaterial,
    pub attributes: KeyAttributes,
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_shows_bytes() {
        let raw = KeyMaterial::raw(vec![0xAB; 4]);
        let rendered = format!("{raw:?}");
        assert!(rendered.contains("len: 4"));
        assert!(!rendered.to_lowercase().contains("ab"));

        let hw = KeyMaterial::Hardware(HardwareRef("hw_secret_token".to_owned()));
        assert!(!format!("{hw:?}").contains("secret"));
        assert!(hw.as_raw().is_none());
    }
}
