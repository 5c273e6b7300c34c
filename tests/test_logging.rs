use snitch::logging::{init_logging, LOG_FILE_NAME};

#[test]
fn test_log_file_receives_run_output() -> anyhow::Result<()> {
    let test_dir = tempfile::tempdir()?;
    let log_dir = test_dir.path().join("logs");

    init_logging(Some(&log_dir), true)?;

    tracing::info!("Test info message");
    tracing::debug!("Test debug message");
    tracing::warn!("Test warning message");

    // Give the appender a moment to flush
    std::thread::sleep(std::time::Duration::from_millis(100));

    let log_file = log_dir.join(LOG_FILE_NAME);
    assert!(log_file.exists(), "log file missing: {}", log_file.display());

    let contents = std::fs::read_to_string(&log_file)?;
    assert!(contents.contains("New run"));
    assert!(contents.contains("Test warning message"));

    // A second call keeps the first subscriber and still succeeds
    init_logging(None, false)?;
    Ok(())
}
