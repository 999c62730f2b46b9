//! Shared logging setup for speclife binaries.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable overriding the speclife home directory.
pub const HOME_ENV: &str = "SPECLIFE_HOME";

const CONSOLE_FILTER: &str = "speclife=warn,speclife_core=warn";
const FILE_FILTER: &str = "speclife=info,speclife_core=info";

/// Logging configuration.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Raise console output to the file filter
    pub verbose: bool,
}

/// Install a daily-rolling file layer and a stderr console layer.
///
/// `RUST_LOG` overrides both filters. If the log directory cannot be
/// created only the console layer is installed. Keep the returned guard
/// alive until exit so buffered file output is flushed.
pub fn init_logging(config: LogConfig<'_>) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().ok();
    let file_filter = || {
        env_filter
            .clone()
            .unwrap_or_else(|| EnvFilter::new(FILE_FILTER))
    };

    let mut guard = None;
    let file_layer = match ensure_logs_dir() {
        Ok(log_dir) => {
            let appender =
                tracing_appender::rolling::daily(log_dir, format!("{}.log", config.app_name));
            let (writer, worker_guard) = tracing_appender::non_blocking(appender);
            guard = Some(worker_guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(file_filter()),
            )
        }
        Err(err) => {
            eprintln!("Warning: {:#}", err);
            None
        }
    };

    let console_filter = if config.verbose {
        file_filter()
    } else {
        env_filter
            .clone()
            .unwrap_or_else(|| EnvFilter::new(CONSOLE_FILTER))
    };
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init();

    guard
}

fn home_from(override_path: Option<OsString>, home: Option<PathBuf>) -> PathBuf {
    match override_path.filter(|p| !p.is_empty()) {
        Some(path) => PathBuf::from(path),
        None => home.unwrap_or_else(|| PathBuf::from(".")).join(".speclife"),
    }
}

/// Speclife home directory: `$SPECLIFE_HOME`, else `~/.speclife`.
pub fn speclife_home() -> PathBuf {
    home_from(std::env::var_os(HOME_ENV), dirs::home_dir())
}

/// Logs directory: `<home>/logs`.
pub fn logs_dir() -> PathBuf {
    speclife_home().join("logs")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_override_wins() {
        let home = home_from(Some(OsString::from("/tmp/sl")), Some(PathBuf::from("/home/u")));
        assert_eq!(home, PathBuf::from("/tmp/sl"));
    }

    #[test]
    fn test_home_defaults_under_user_home() {
        let home = home_from(None, Some(PathBuf::from("/home/u")));
        assert_eq!(home, PathBuf::from("/home/u/.speclife"));
        let empty = home_from(Some(OsString::new()), Some(PathBuf::from("/home/u")));
        assert_eq!(empty, PathBuf::from("/home/u/.speclife"));
    }
}
