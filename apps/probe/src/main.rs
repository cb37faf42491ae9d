use anyhow::Context as _;
use layerconf::backends::{EnvBackend, FlagBackend};
use layerconf::{Context, LoadError};
use layerconf_logger::{Logger, parse_level};
use layerconf_probe::{ENV_PREFIX, ProbeConfig};
use std::io::Write;

fn main() -> anyhow::Result<()> {
    let flags = FlagBackend::new();
    let env = EnvBackend::new().with_prefix(ENV_PREFIX);

    let config = match ProbeConfig::resolve(&Context::background(), &[&flags, &env]) {
        Ok(config) => config,
        Err(LoadError::HelpRequested { usage }) => {
            std::io::stdout().lock().write_all(usage.as_bytes())?;
            return Ok(());
        },
        Err(err) => return Err(err).context("Critical: configuration is invalid"),
    };

    let _log = Logger::builder()
        .level(parse_level(&config.log_level)?)
        .format(config.log_format())
        .stderr()
        .init()?;

    tracing::info!(
        remaining = flags.remaining().map_or(0, <[_]>::len),
        "configuration resolved"
    );

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, &config)?;
    writeln!(stdout)?;
    Ok(())
}
