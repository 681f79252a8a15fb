//! Thin wrappers over the RustCrypto primitives. Everything here is synchronous and pure;
//! storage, logging and option handling live in the provider.

pub(crate) mod aead;
pub(crate) mod digest;
pub(crate) mod kdf;
pub(crate) mod random;
pub(crate) mod signature;
