#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the Bastion crates.
//!
//! Every crate in the workspace declares its error enum through [`macro@bastion_error`], so
//! context handling, `?` conversions and the `Internal` fallback behave the same way from
//! the storage layer up to the crypto engine.
//!
//! ```toml
//! [dependencies]
//! bastion-derive = { path = "../infra/derive" }
//! ```

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for declaring a crate's error enum.
///
/// # Injected Items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * `<Name>Ext` trait with `.context(...)` for `Result<T, Name>` and for
///   `Result<T, Source>` of every variant that wraps a source error.
/// * `From<Source>` for each source-carrying variant so `?` works on upstream errors.
/// * `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * `Name::context_str()` returning the attached context, if any.
/// * A private `format_context` helper usable from `#[error(...)]` strings.
///
/// # Requirements
///
/// 1. Only enums with named-field variants are accepted.
/// 2. A `context` field must be typed `Option<Cow<'static, str>>`.
/// 3. Variants that carry a `source` (or a field marked `#[source]`/`#[from]`) must also
///    carry a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use bastion_derive::bastion_error;
/// use std::borrow::Cow;
///
/// #[bastion_error]
/// pub enum StoreError {
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn load(path: &str) -> Result<Vec<u8>, StoreError> {
///     std::fs::read(path).context("Reading blob")
/// }
/// ```
#[proc_macro_attribute]
pub fn bastion_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}
