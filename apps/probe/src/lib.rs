//! # Probe
//!
//! A small binary that resolves [`ProbeConfig`] from command-line flags and `PROBE_*`
//! environment variables, then prints the result as JSON. It exercises every field kind and is
//! driven end to end by the integration tests.

use layerconf::{Backend, Config, Context, LoadError, load};
use layerconf_logger::LogFormat;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prefix of the environment variables consulted after the flags.
pub const ENV_PREFIX: &str = "PROBE_";

/// Every supported kind, each once without and once with a preset default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Config)]
pub struct ProbeConfig {
    #[config("a")]
    pub a: String,
    #[config("a-def,short=ad,description=String with a default")]
    pub a_def: String,
    #[config("b")]
    pub b: bool,
    #[config("b-def,short=bd,description=Bool with a default")]
    pub b_def: bool,
    #[config("c")]
    pub c: Duration,
    #[config("c-def,short=cd,description=Duration with a default")]
    pub c_def: Duration,
    #[config("d")]
    pub d: i64,
    #[config("d-def,short=dd,description=Signed integer with a default")]
    pub d_def: i64,
    #[config("e")]
    pub e: u64,
    #[config("e-def,short=ed")]
    pub e_def: u64,
    #[config("f")]
    pub f: f32,
    #[config("f-def,short=fd")]
    pub f_def: f32,

    #[config("log-level,description=Minimum level logged to stderr")]
    pub log_level: String,
    #[config("log-json,description=Log JSON lines instead of text")]
    pub log_json: bool,
}

impl Default for ProbeConfig {
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
            e_def: 0,
            f: 0.0,
            f_def: 0.0,
            log_level: "warn".to_owned(),
            log_json: false,
        }
    }
}

impl ProbeConfig {
    /// Starts from the defaults and applies `backends` in order.
    pub fn resolve(ctx: &Context, backends: &[&dyn Backend]) -> Result<Self, LoadError> {
        let mut config = Self::default();
        load(ctx, &mut config, backends)?;
        Ok(config)
    }

    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        if self.log_json { LogFormat::Json } else { LogFormat::Compact }
    }
}
