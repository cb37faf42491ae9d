//! # Load errors
//!
//! Every failure of a resolution pass surfaces as a [`LoadError`] returned from
//! [`load`](crate::load); nothing is logged or swallowed on the way.

use crate::backend::BackendError;
use crate::field::TypeKind;
use std::borrow::Cow;

/// Errors returned by a resolution pass.
#[layerconf_derive::layerconf_error]
pub enum LoadError {
    /// A field tag could not be parsed. Raised before any backend is queried.
    #[error("Malformed tag on field `{field}`{}: {message}", format_context(.context))]
    MalformedTag {
        field: &'static str,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    /// No backend supplied a value for a required field.
    #[error("Missing required field `{key}`{}", format_context(.context))]
    MissingRequiredField { key: &'static str, context: Option<Cow<'static, str>> },

    /// A raw value did not parse into the field's kind.
    #[error("Cannot convert {raw:?} to {kind} for field `{key}`{}: {reason}", format_context(.context))]
    TypeConversion {
        key: &'static str,
        raw: String,
        kind: TypeKind,
        reason: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    /// A backend failed for a reason other than a missing key.
    #[error("Backend `{backend}` failed to look up `{key}`{}: {source}", format_context(.context))]
    BackendLookup {
        backend: String,
        key: &'static str,
        #[source]
        source: BackendError,
        context: Option<Cow<'static, str>>,
    },

    /// The context was cancelled or its deadline passed mid-resolution.
    #[error("Resolution canceled{}: {reason}", format_context(.context))]
    Canceled { reason: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The command line did not match the registered flags.
    #[error("Invalid command line{}: {message}", format_context(.context))]
    FlagParse { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// `-help` was passed on the command line; `usage` holds the rendered flag summary.
    #[error("Help requested")]
    HelpRequested { usage: String },
}

impl LoadError {
    /// The configuration key the error is about, when there is one.
    #[must_use]
    pub const fn key(&self) -> Option<&'static str> {
        match self {
            Self::MissingRequiredField { key, .. }
            | Self::TypeConversion { key, .. }
            | Self::BackendLookup { key, .. } => Some(*key),
            _ => None,
        }
    }
}
