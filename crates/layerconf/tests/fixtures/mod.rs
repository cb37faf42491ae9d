#![allow(dead_code)]

use layerconf::{Backend, BackendError, Config, Context};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A record covering every kind, with the defaults pre-set the way callers express them.
#[derive(Debug, Clone, PartialEq, Config)]
pub struct Settings {
    #[config("a")]
    pub a: String,
    #[config("a-def,short=ad")]
    pub a_def: String,
    #[config("b")]
    pub b: bool,
    #[config("b-def,short=bd")]
    pub b_def: bool,
    #[config("c")]
    pub c: Duration,
    #[config("c-def,short=cd")]
    pub c_def: Duration,
    #[config("d")]
    pub d: i64,
    #[config("d-def,short=dd")]
    pub d_def: i64,
    #[config("e")]
    pub e: u32,
    #[config("f")]
    pub f: f32,
    pub untagged: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            a: String::new(),
            a_def: "hello".to_owned(),
            b: false,
            b_def: true,
            c: Duration::ZERO,
            c_def: Duration::from_secs(10),
            d: 0,
            d_def: -100,
            e: 0,
            f: 0.0,
            untagged: 7,
        }
    }
}

/// Three fields where the middle one is required.
#[derive(Debug, Clone, PartialEq, Eq, Default, Config)]
pub struct Ordered {
    #[config("first")]
    pub first: String,
    #[config("int,required")]
    pub int: i32,
    #[config("last")]
    pub last: String,
}

/// Fails every lookup with an I/O error and counts the calls.
#[derive(Debug, Default)]
pub struct BrokenBackend {
    pub calls: AtomicUsize,
}

impl BrokenBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Backend for BrokenBackend {
    fn name(&self) -> &str {
        "broken"
    }

    fn get(&self, _ctx: &Context, _key: &str) -> Result<Vec<u8>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(std::io::Error::other("disk on fire").into())
    }
}

/// Cancels the shared context on the first lookup, then reports not-found.
#[derive(Debug)]
pub struct CancellingBackend {
    pub ctx: Context,
}

impl Backend for CancellingBackend {
    fn name(&self) -> &str {
        "cancelling"
    }

    fn get(&self, _ctx: &Context, key: &str) -> Result<Vec<u8>, BackendError> {
        self.ctx.cancel();
        Err(BackendError::not_found(key))
    }
}
