//! # Layerconf
//!
//! Populates the fields of a plain struct from an ordered list of configuration backends.
//!
//! Fields opt in with a `#[config("...")]` tag naming the key to look up:
//!
//! ```text
//! <key>[,short=<alias>][,required][,backend=<name>][,description=<text>]
//! ```
//!
//! For every tagged field the backends are asked in order; the first one holding the key wins,
//! and its raw bytes are coerced into the field's type (strings, bools, integers and floats of
//! every width, and [`std::time::Duration`] in `1h30m` notation). Fields no backend knows keep
//! whatever value the struct already had, so defaults are just the initial values.
//!
//! * [`backends::FlagBackend`] turns the tags into command-line flags.
//! * [`backends::EnvBackend`] reads environment variables.
//! * [`backends::MapBackend`] serves an in-memory table, typically defaults or test fixtures.
//! * Implement [`Backend`] to plug in anything else.
//!
//! ## Example
//!
//! ```rust
//! use layerconf::backends::{FlagBackend, MapBackend};
//! use layerconf::{Config, Context, load};
//! use std::time::Duration;
//!
//! #[derive(Debug, Config)]
//! struct Server {
//!     #[config("addr,required")]
//!     addr: String,
//!     #[config("read-timeout,short=rt")]
//!     read_timeout: Duration,
//!     #[config("verbose")]
//!     verbose: bool,
//! }
//!
//! let mut server = Server { addr: String::new(), read_timeout: Duration::from_secs(5), verbose: false };
//! let flags = FlagBackend::from_args(["-rt=1m30s", "-verbose"]);
//! let fallback = MapBackend::new().with("addr", "0.0.0.0:8080");
//!
//! load(&Context::background(), &mut server, &[&flags, &fallback])?;
//!
//! assert_eq!(server.addr, "0.0.0.0:8080");
//! assert_eq!(server.read_timeout, Duration::from_secs(90));
//! assert!(server.verbose);
//! # Ok::<(), layerconf::LoadError>(())
//! ```

mod backend;
pub mod backends;
mod coerce;
mod context;
mod error;
pub mod field;
mod loader;
mod value;

pub use crate::backend::{Backend, BackendError, BackendErrorExt};
pub use crate::coerce::{CoerceError, coerce, parse_duration};
pub use crate::context::Context;
pub use crate::error::{LoadError, LoadErrorExt};
pub use crate::field::{Configurable, FieldDescriptor, FieldSpec, TypeKind};
pub use crate::loader::{Loader, load};
pub use crate::value::{ConfigField, Value};
pub use layerconf_derive::Config;
