#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for `layerconf`.
//!
//! * [`Config`] turns a struct's `#[config("...")]` field tags into the static field table the
//!   resolver consumes, so no run-time reflection is needed.
//! * [`layerconf_error`] wires error enums into the workspace error conventions.
//!
//! The generated code refers to `::layerconf`, so consumers depend on the `layerconf` crate,
//! which re-exports the derive.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `layerconf::Configurable` for a struct with named fields.
///
/// Every field carrying a `#[config("...")]` attribute becomes resolvable. The tag string uses the
/// form `"<key>[,short=<alias>][,required][,backend=<name>][,description=<text>]"`; fields without
/// the attribute, or tagged `"-"`, are left alone.
///
/// The field type must implement `layerconf::ConfigField`, which fixes its coercion kind.
///
/// # Errors
/// Emits a compile-time error when:
/// * the input is not a struct with named fields,
/// * a tag is not a string literal or has an empty key,
/// * two fields share a key or alias.
///
/// # Example
///
/// ```rust,ignore
/// use layerconf::Config;
/// use std::time::Duration;
///
/// #[derive(Debug, Default, Config)]
/// struct ServerConfig {
///     #[config("listen-addr,short=l,required")]
///     listen_addr: String,
///     #[config("read-timeout")]
///     read_timeout: Duration,
///     // Not resolvable.
///     cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Config, attributes(config))]
pub fn derive_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    macros::config::expand_derive(input).into()
}

/// Attribute macro for defining error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` when missing.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` carrying this error, or a source error convertible into it.
/// * **Standard Conversions**: Implements `From<Source>` for variants whose only fields are
///   the source and `context`, enabling `?` on upstream errors.
/// * **Internal Fallback**: Provides `From<&'static str>` and `From<String>` when an
///   `Internal { message, context }` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants.
/// 2. `context` fields must have the type `Option<Cow<'static, str>>`.
/// 3. Variants with a `source` field (or a `#[source]`/`#[from]` field) must also carry `context`.
///
/// # Example
///
/// ```rust,ignore
/// use layerconf_derive::layerconf_error;
/// use std::borrow::Cow;
///
/// #[layerconf_error]
/// pub enum FileError {
///     #[error("I/O error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn layerconf_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
