//! Kernel utilities shared across the Bastion crates.
//! Keep this crate lightweight: deployment environment, config loading and identifier helpers.
//!
//! ## ID generation
//! Use `safe_nanoid!` for URL-safe, unambiguous IDs:
//! ```rust
//! # use bastion_kernel::safe_nanoid;
//! let id = safe_nanoid!();
//! assert_eq!(id.len(), 12);
//! ```
//!
//! ## Environment
//! ```rust
//! use bastion_kernel::environment::{CryptoEnvironment, DeploymentType, PARAM_PROVIDER};
//!
//! let env = CryptoEnvironment::builder()
//!     .kind(DeploymentType::Production)
//!     .has_hardware_security(true)
//!     .build()
//!     .with_parameter(PARAM_PROVIDER, "portable");
//!
//! assert_eq!(env.parameter(PARAM_PROVIDER), Some("portable"));
//! ```
pub mod config;
pub mod environment;

// Alphabet excludes visually ambiguous characters (I, O, l, 0, 1).
pub const SAFE_ALPHABET: &[char; 55] = &[
    '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f',
    'g', 'h', 'j', 'k', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

pub use nanoid::nanoid;

/// Generates an unambiguous `NanoID` (no visually confusing characters).
#[macro_export]
macro_rules! safe_nanoid {
    () => {
        $crate::nanoid!(12, $crate::SAFE_ALPHABET)
    };
    ($size:expr) => {
        $crate::nanoid!($size, $crate::SAFE_ALPHABET)
    };
}
