//! Logging initialization
//!
//! Text or JSON output through a non-blocking writer: stdout, a plain file,
//! or daily-rotated files.

use std::io::Write;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::errors::{Result, ShortenerError};

const DEFAULT_LOG_NAME: &str = "shortener.log";

fn make_writer(config: &LoggingConfig) -> Result<Box<dyn Write + Send + Sync>> {
    let Some(log_file) = config.file.as_deref().filter(|f| !f.is_empty()) else {
        return Ok(Box::new(std::io::stdout()));
    };

    if config.enable_rotation {
        let path = Path::new(log_file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_LOG_NAME);

        let appender = rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix(name.trim_end_matches(".log"))
            .filename_suffix("log")
            .max_log_files(config.max_backups.max(1) as usize)
            .build(dir)
            .map_err(|e| {
                ShortenerError::file_operation(format!(
                    "cannot create rolling log in '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        return Ok(Box::new(appender));
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| {
            ShortenerError::file_operation(format!("cannot open log file '{}': {}", log_file, e))
        })?;
    Ok(Box::new(file))
}

/// Install the global subscriber.
///
/// The returned guard flushes buffered lines on drop; keep it alive until the
/// process exits. `RUST_LOG`, when set, overrides `logging.level`.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let writer = make_writer(config)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(writer);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| {
            ShortenerError::config(format!("invalid log level '{}': {}", config.level, e))
        })?;

    let to_console = config.file.as_deref().is_none_or(str::is_empty);
    let builder = tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(to_console);

    let installed = if config.format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ShortenerError::config(format!("logging already initialized: {}", e)))?;

    Ok(guard)
}
