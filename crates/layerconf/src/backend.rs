use crate::context::Context;
use crate::error::LoadError;
use crate::field::FieldDescriptor;
use std::borrow::Cow;
use std::sync::Arc;

/// Lookup failures reported by a [`Backend`].
#[layerconf_derive::layerconf_error]
pub enum BackendError {
    /// The backend holds no value for the key. The resolver moves on to the next backend.
    #[error("Key not found{}: {key}", format_context(.context))]
    NotFound { key: String, context: Option<Cow<'static, str>> },

    #[error("Backend I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Backend failure{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl BackendError {
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into(), context: None }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A source of raw configuration values.
///
/// Backends are consulted in the order handed to the resolver; the first one returning a value
/// for a key wins. Anything other than [`BackendError::NotFound`] aborts the pass.
pub trait Backend: Send + Sync {
    /// Identifies the backend in diagnostics and in `backend=<name>` tag options.
    fn name(&self) -> &str;

    /// Looks up the raw bytes stored under `key`.
    ///
    /// # Errors
    /// Returns [`BackendError::NotFound`] when the key is absent.
    fn get(&self, ctx: &Context, key: &str) -> Result<Vec<u8>, BackendError>;

    /// Called once per pass, before any lookup, with the descriptors of the target record.
    ///
    /// # Errors
    /// A failure aborts the pass.
    fn prepare(&self, fields: &[FieldDescriptor]) -> Result<(), LoadError> {
        let _ = fields;
        Ok(())
    }
}

impl<B: Backend + ?Sized> Backend for &B {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(&self, ctx: &Context, key: &str) -> Result<Vec<u8>, BackendError> {
        (**self).get(ctx, key)
    }

    fn prepare(&self, fields: &[FieldDescriptor]) -> Result<(), LoadError> {
        (**self).prepare(fields)
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(&self, ctx: &Context, key: &str) -> Result<Vec<u8>, BackendError> {
        (**self).get(ctx, key)
    }

    fn prepare(&self, fields: &[FieldDescriptor]) -> Result<(), LoadError> {
        (**self).prepare(fields)
    }
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(&self, ctx: &Context, key: &str) -> Result<Vec<u8>, BackendError> {
        (**self).get(ctx, key)
    }

    fn prepare(&self, fields: &[FieldDescriptor]) -> Result<(), LoadError> {
        (**self).prepare(fields)
    }
}
