#![allow(unreachable_pub)]

//! # Macros
//!
//! Procedural macros shared by the Ember infrastructure crates.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! ember-derive = { path = "../infra/derive" }
//! thiserror = "2"
//! ```
//!
//! Consumers must depend on `thiserror` themselves; the expansion refers to `::thiserror::Error`.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Turns an enum into a crate error type.
///
/// # Injected items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * `<Name>Ext` trait with `.context(...)` for `Result<T, Name>`, and for
///   `Result<T, Source>` of every variant that wraps a source error.
/// * `From<Source>` for each source-wrapping variant, so `?` works on upstream errors.
/// * `From<&'static str>` / `From<String>` when an `Internal { message, context }` variant exists.
/// * A private `format_context` helper for use inside `#[error(...)]` strings.
///
/// # Requirements
///
/// Every variant uses named fields. A variant with a `source` field (or a field marked
/// `#[source]`/`#[from]`) must also have `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[ember_derive::ember_error]
/// pub enum LoadError {
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read() -> Result<String, LoadError> {
///     std::fs::read_to_string("scene.toml").context("Reading scene file")
/// }
/// ```
#[proc_macro_attribute]
pub fn ember_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}
