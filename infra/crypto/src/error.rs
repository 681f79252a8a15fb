//! # Crypto Errors
//!
//! [`CryptoError`] is the only error type crossing the engine boundary. Primitive and
//! storage failures are re-mapped into it; callers that branch on failures should use
//! [`CryptoError::kind`] rather than matching variants.

use bastion_storage::StorageError;
use std::borrow::Cow;

/// Stable, transport-friendly classification of a [`CryptoError`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::AsRefStr,
    strum_macros::EnumIter,
)]
pub enum ErrorKind {
    InvalidInput,
    KeyNotFound,
    DataNotFound,
    DataCorrupted,
    AuthenticationFailed,
    UnsupportedAlgorithm,
    UnsupportedMode,
    UnsupportedOperation,
    EncryptionFailed,
    DecryptionFailed,
    SigningFailed,
    VerificationFailed,
    KeyDerivationFailed,
    KeyGenerationFailed,
    StorageFailure,
    InternalError,
}

#[bastion_derive::bastion_error]
pub enum CryptoError {
    /// Empty or out-of-range argument, rejected before any primitive runs.
    #[error("Invalid input{}: {message}", format_context(.context))]
    InvalidInput { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Key not found{}: {message}", format_context(.context))]
    KeyNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Data not found{}: {message}", format_context(.context))]
    DataNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Structural envelope violation (length, key id bounds, version byte).
    #[error("Data corrupted{}: {message}", format_context(.context))]
    DataCorrupted { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Tag mismatch. On the password path this also covers a wrong password.
    #[error("Authentication failed{}: {message}", format_context(.context))]
    AuthenticationFailed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Unsupported algorithm{}: {message}", format_context(.context))]
    UnsupportedAlgorithm { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Unsupported mode{}: {message}", format_context(.context))]
    UnsupportedMode { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The operation is impossible for this key or provider, e.g. exporting a hardware key.
    #[error("Unsupported operation{}: {message}", format_context(.context))]
    UnsupportedOperation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Encryption failed{}: {message}", format_context(.context))]
    EncryptionFailed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Decryption failed{}: {message}", format_context(.context))]
    DecryptionFailed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Signing failed{}: {message}", format_context(.context))]
    SigningFailed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Verification failed{}: {message}", format_context(.context))]
    VerificationFailed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Key derivation failed{}: {message}", format_context(.context))]
    KeyDerivationFailed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Key generation failed{}: {message}", format_context(.context))]
    KeyGenerationFailed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Storage failure{}: {source}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    /// Unexpected provider fault.
    #[error("Internal crypto error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl CryptoError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Self::DataNotFound { .. } => ErrorKind::DataNotFound,
            Self::DataCorrupted { .. } => ErrorKind::DataCorrupted,
            Self::AuthenticationFailed { .. } => ErrorKind::AuthenticationFailed,
            Self::UnsupportedAlgorithm { .. } => ErrorKind::UnsupportedAlgorithm,
            Self::UnsupportedMode { .. } => ErrorKind::UnsupportedMode,
            Self::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            Self::EncryptionFailed { .. } => ErrorKind::EncryptionFailed,
            Self::DecryptionFailed { .. } => ErrorKind::DecryptionFailed,
            Self::SigningFailed { .. } => ErrorKind::SigningFailed,
            Self::VerificationFailed { .. } => ErrorKind::VerificationFailed,
            Self::KeyDerivationFailed { .. } => ErrorKind::KeyDerivationFailed,
            Self::KeyGenerationFailed { .. } => ErrorKind::KeyGenerationFailed,
            Self::Storage { .. } => ErrorKind::StorageFailure,
            Self::Internal { .. } => ErrorKind::InternalError,
        }
    }

    pub(crate) fn invalid_input(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidInput { message: message.into(), context: None }
    }

    pub(crate) fn key_not_found(id: &str) -> Self {
        Self::KeyNotFound { message: id.to_owned().into(), context: None }
    }

    pub(crate) fn data_not_found(id: &str) -> Self {
        Self::DataNotFound { message: id.to_owned().into(), context: None }
    }

    pub(crate) fn data_corrupted(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DataCorrupted { message: message.into(), context: None }
    }

    pub(crate) fn authentication_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::AuthenticationFailed { message: message.into(), context: None }
    }

    pub(crate) fn unsupported_algorithm(message: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedAlgorithm { message: message.into(), context: None }
    }

    pub(crate) fn unsupported_operation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedOperation { message: message.into(), context: None }
    }
}
