//! Built-in [`Backend`](crate::Backend) implementations.
//!
//! * [`FlagBackend`]: command-line flags derived from the target record's tags.
//! * [`EnvBackend`]: process environment, or a captured snapshot of it.
//! * [`MapBackend`]: fixed in-memory values.

mod env;
mod flags;
mod map;

pub use env::EnvBackend;
pub use flags::FlagBackend;
pub use map::MapBackend;
