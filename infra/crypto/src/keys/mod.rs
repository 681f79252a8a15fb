//! Key management: identifier rules, material representation, the [`KeyStore`] and
//! the [`KeyManagementService`] lifecycle layer on top of it.

mod identifier;
mod material;
mod service;
mod store;

pub use identifier::{MAX_KEY_ID_LEN, is_sanitized, sanitize};
pub use material::{HardwareRef, KeyAttributes, KeyEntry, KeyMaterial};
pub use service::{KeyManagementService, RotatedKey};
pub use store::{KEY_NAMESPACE, KeyStore};
