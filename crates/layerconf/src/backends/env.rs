use crate::backend::{Backend, BackendError};
use crate::context::Context;
use fxhash::FxHashMap;
use std::ffi::OsString;

#[derive(Debug, Clone)]
enum Source {
    Process,
    Snapshot(FxHashMap<String, OsString>),
}

/// Reads values from environment variables.
///
/// A key is looked up as-is first, then in its normalized form: uppercased, with `-` and `.`
/// turned into `_`. With a prefix, both forms are prefixed, so `read-timeout` under prefix `APP_`
/// is found as `APP_read-timeout` or `APP_READ_TIMEOUT`.
#[derive(Debug, Clone)]
pub struct EnvBackend {
    prefix: String,
    source: Source,
}

impl Default for EnvBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvBackend {
    /// Reads the live process environment.
    #[must_use]
    pub const fn new() -> Self {
        Self { prefix: String::new(), source: Source::Process }
    }

    /// Reads a fixed set of variables instead of the process environment.
    #[must_use]
    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<OsString>,
    {
        let vars = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { prefix: String::new(), source: Source::Snapshot(vars) }
    }

    /// Prepends `prefix` to every variable name looked up.
    #[must_use = "The backend is returned with the prefix applied"]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Variable names tried for `key`, in order.
    fn candidates(&self, key: &str) -> Vec<String> {
        let exact = format!("{}{key}", self.prefix);
        let normalized = format!("{}{}", self.prefix, normalize(key));
        if exact == normalized { vec![exact] } else { vec![exact, normalized] }
    }

    fn var(&self, name: &str) -> Option<OsString> {
        match &self.source {
            Source::Process => std::env::var_os(name),
            Source::Snapshot(vars) => vars.get(name).cloned(),
        }
    }
}

fn normalize(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '-' | '.' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

impl Backend for EnvBackend {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, _ctx: &Context, key: &str) -> Result<Vec<u8>, BackendError> {
        self.candidates(key)
            .iter()
            .find_map(|name| self.var(name))
            .map(OsString::into_encoded_bytes)
            .ok_or_else(|| BackendError::not_found(key))
    }
}
