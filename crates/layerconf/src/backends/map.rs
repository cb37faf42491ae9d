use crate::backend::{Backend, BackendError};
use crate::context::Context;
use fxhash::FxHashMap;
use std::borrow::Cow;

/// An immutable in-memory key/value backend.
#[derive(Debug, Clone)]
pub struct MapBackend {
    name: Cow<'static, str>,
    values: FxHashMap<String, Vec<u8>>,
}

impl Default for MapBackend {
    fn default() -> Self {
        Self::named("map")
    }
}

impl MapBackend {
    /// An empty backend named `map`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty backend reporting `name` in diagnostics.
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into(), values: FxHashMap::default() }
    }

    /// Stores `value` under `key`, replacing any previous value.
    #[must_use = "The backend is returned with the new value"]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for MapBackend
where
    K: Into<String>,
    V: Into<Vec<u8>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |backend, (key, value)| backend.with(key, value))
    }
}

impl Backend for MapBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, _ctx: &Context, key: &str) -> Result<Vec<u8>, BackendError> {
        self.values.get(key).cloned().ok_or_else(|| BackendError::not_found(key))
    }
}
