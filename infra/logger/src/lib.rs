//! # Logger
//!
//! Installs the global `tracing` subscriber for layerconf binaries.
//!
//! Output goes either to stderr, keeping stdout free for program output, or to a rolling file
//! written by a non-blocking worker. Both targets can render compact text or JSON lines. The
//! builder only offers [`LoggerBuilder::init`] once a target has been chosen.
//!
//! `RUST_LOG` is honored unless explicit directives are given with
//! [`LoggerBuilder::directives`].
//!
//! ## Example
//!
//! ```rust
//! use layerconf_logger::{LogFormat, Logger, parse_level};
//!
//! let _logger = Logger::builder()
//!     .stderr()
//!     .level(parse_level("debug")?)
//!     .format(LogFormat::Compact)
//!     .init()?;
//! # Ok::<(), layerconf_logger::LoggerError>(())
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use private::Sealed;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const DEFAULT_MAX_FILES: usize = 7;
const LOG_FILE_SUFFIX: &str = "log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// How events are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(LoggerError::UnknownSetting {
                what: "log format",
                value: s.to_owned(),
                context: None,
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compact => "compact",
            Self::Json => "json",
        })
    }
}

/// Parses a level name such as `info`, `WARN` or `off`.
///
/// # Errors
/// Returns [`LoggerError::UnknownSetting`] for anything `tracing` does not recognize.
pub fn parse_level(value: &str) -> Result<LevelFilter, LoggerError> {
    value.trim().parse::<LevelFilter>().map_err(|_| LoggerError::UnknownSetting {
        what: "log level",
        value: value.to_owned(),
        context: None,
    })
}

#[derive(Debug)]
struct Settings {
    level: LevelFilter,
    format: LogFormat,
    directives: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self { level: LevelFilter::INFO, format: LogFormat::Compact, directives: None }
    }
}

/// No output chosen yet.
#[derive(Debug)]
pub struct Unset;

/// Events go to stderr.
#[derive(Debug)]
pub struct Stderr;

/// Events go to a rolling file in `dir`, named `<prefix>.<date>.log`.
#[derive(Debug)]
pub struct RollingFile {
    dir: PathBuf,
    prefix: String,
    rotation: Rotation,
    max_files: usize,
}

mod private {
    pub trait Sealed {}
}
impl Sealed for Unset {}
impl Sealed for Stderr {}
impl Sealed for RollingFile {}

/// Configures and installs the global subscriber.
#[derive(Debug)]
pub struct LoggerBuilder<O: Sealed = Unset> {
    settings: Settings,
    output: O,
}

impl<O: Sealed> LoggerBuilder<O> {
    /// Minimum level emitted when no directives are given.
    #[must_use = "The builder must be initialized to install the subscriber"]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.settings.level = level;
        self
    }

    #[must_use = "The builder must be initialized to install the subscriber"]
    pub const fn format(mut self, format: LogFormat) -> Self {
        self.settings.format = format;
        self
    }

    /// Filter directives such as `layerconf=trace,warn`, replacing `RUST_LOG`.
    ///
    /// Invalid directives make [`LoggerBuilder::init`] fail.
    #[must_use = "The builder must be initialized to install the subscriber"]
    pub fn directives(mut self, directives: impl Into<String>) -> Self {
        self.settings.directives = Some(directives.into());
        self
    }

    /// Writes events to stderr.
    pub fn stderr(self) -> LoggerBuilder<Stderr> {
        LoggerBuilder { settings: self.settings, output: Stderr }
    }

    /// Writes events to daily rolling files in `dir`, named after `prefix`.
    pub fn file(self, dir: impl Into<PathBuf>, prefix: impl Into<String>) -> LoggerBuilder<RollingFile> {
        LoggerBuilder {
            settings: self.settings,
            output: RollingFile {
                dir: dir.into(),
                prefix: prefix.into(),
                rotation: Rotation::DAILY,
                max_files: DEFAULT_MAX_FILES,
            },
        }
    }
}

impl LoggerBuilder<RollingFile> {
    #[must_use = "The builder must be initialized to install the subscriber"]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.output.rotation = rotation;
        self
    }

    /// Number of rotated files kept on disk.
    #[must_use = "The builder must be initialized to install the subscriber"]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.output.max_files = max;
        self
    }

    /// Installs the subscriber.
    ///
    /// The returned [`Logger`] owns the file writer's worker; keep it alive until shutdown so
    /// buffered events are flushed.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty prefix, zero `max_files` or bad
    ///   directives.
    /// * [`LoggerError::Io`] if the directory cannot be created.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already set.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let RollingFile { dir, prefix, rotation, max_files } = self.output;
        if prefix.trim().is_empty() {
            return Err(invalid("log file prefix cannot be empty"));
        }
        if max_files == 0 {
            return Err(invalid("max_files must be greater than zero"));
        }
        let filter = build_filter(&self.settings)?;

        fs::create_dir_all(&dir).context(format!("creating {}", dir.display()))?;
        let appender = RollingFileAppender::builder()
            .rotation(rotation)
            .filename_prefix(&prefix)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(max_files)
            .build(&dir)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let base = layer().with_writer(writer).with_ansi(false);
        let output: BoxedLayer = match self.settings.format {
            LogFormat::Compact => base.compact().boxed(),
            LogFormat::Json => base.json().boxed(),
        };

        install(output, filter)?;
        Ok(Logger { guard: Some(guard) })
    }
}

impl LoggerBuilder<Stderr> {
    /// Installs the subscriber.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for bad directives.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already set.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let filter = build_filter(&self.settings)?;

        let base = layer().with_writer(std::io::stderr);
        let output: BoxedLayer = match self.settings.format {
            LogFormat::Compact => base.compact().with_ansi(true).boxed(),
            LogFormat::Json => base.json().with_ansi(false).boxed(),
        };

        install(output, filter)?;
        Ok(Logger { guard: None })
    }
}

/// Handle to the installed subscriber.
#[must_use = "Dropping this handle stops the background file writer"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { settings: Settings::default(), output: Unset }
    }

    /// Whether a background file writer is attached.
    #[must_use]
    pub const fn writes_to_file(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::debug!("flushing log file");
        }
    }
}

fn invalid(message: &'static str) -> LoggerError {
    LoggerError::InvalidConfiguration { message: message.into(), context: None }
}

fn build_filter(settings: &Settings) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(settings.level.into());
    match &settings.directives {
        None => Ok(builder.from_env_lossy()),
        Some(directives) => builder.parse(directives).map_err(|e| LoggerError::InvalidConfiguration {
            message: format!("invalid directives '{directives}': {e}").into(),
            context: None,
        }),
    }
}

fn install(output: BoxedLayer, filter: EnvFilter) -> Result<(), LoggerError> {
    tracing_subscriber::registry().with(output).with(filter).try_init()?;
    Ok(())
}
