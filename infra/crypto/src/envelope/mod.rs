//! # Envelope Codec
//!
//! Pure encode/decode for the two binary layouts the engine persists. Decoders validate
//! structure only and fail with [`CryptoError::DataCorrupted`](crate::CryptoError) before
//! any primitive runs.
//!
//! | Layout    | Bytes                                                                 |
//! |-----------|-----------------------------------------------------------------------|
//! | symmetric | `[nonce 12][ciphertext ‖ tag][key id len 1][key id]`                  |
//! | password  | `[version 0x01][salt 16][nonce 12][iterations u32 BE][ciphertext ‖ tag]` |

mod password;
mod symmetric;

pub use password::{
    DEFAULT_PASSWORD_ITERATIONS, MAX_PASSWORD_ITERATIONS, MIN_PASSWORD_ENVELOPE_LEN,
    PASSWORD_ENVELOPE_VERSION, PasswordEnvelope, SALT_LEN,
};
pub use symmetric::{MIN_SYMMETRIC_ENVELOPE_LEN, SymmetricEnvelope};

pub use crate::primitives::aead::{NONCE_LEN, TAG_LEN};
