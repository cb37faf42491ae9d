use layerconf_logger::{LevelFilter, LogFormat, Logger};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn json_lines_land_in_the_log_directory() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("nested").join("logs");

    let logger = Logger::builder()
        .level(LevelFilter::DEBUG)
        .format(LogFormat::Json)
        .file(&log_dir, "probe")
        .init()?;
    assert!(logger.writes_to_file());

    tracing::debug!(fields = 3, "configuration loaded");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(log_file)?;
    let line = contents.lines().next().expect("at least one event");
    assert!(line.starts_with('{'), "{line}");
    assert!(line.contains("configuration loaded"), "{line}");

    Ok(())
}
