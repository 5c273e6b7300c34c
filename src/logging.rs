/// Run logging configuration.
///
/// Diagnostics go to stderr so stdout stays clean for the rendered report
/// and CSV output. When a log directory is given, each run is also appended
/// to `{log_dir}/snitch.log` behind a separator line.
use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_NAME: &str = "snitch.log";

/// Initializes logging for one run.
///
/// # Arguments
///
/// * `log_dir` - Directory for the persistent log file, if any
/// * `verbose` - Default to `debug` instead of `info` when `RUST_LOG` is unset
pub fn init_logging(log_dir: Option<&Path>, verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},reqwest=warn,hyper=warn", default_level)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false);

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            write_run_separator(dir);

            let file_appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false) // No ANSI codes in log files
                    .with_target(true)
                    .with_line_number(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .ok(); // Ignore error if already initialized

    Ok(())
}

fn write_run_separator(log_dir: &Path) {
    use std::io::Write;

    let separator = format!(
        "\n{sep}\n[{ts}] New run\n{sep}",
        sep = "=".repeat(80),
        ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
    );
    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE_NAME))
    {
        let _ = writeln!(file, "{}", separator);
    }
}
