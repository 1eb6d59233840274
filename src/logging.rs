//! Logging setup: human-readable stdout layer plus a JSON rolling log file.

use std::ffi::OsStr;
use std::path::Path;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::ParseError,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub const DEFAULT_CONSOLE_FILTER: &str = "info";
pub const DEFAULT_FILE_FILTER: &str = "debug";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_file_path: String,
    pub console_filter: String,
    pub file_filter: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            log_file_path: std::env::var("LOG_FILE_PATH")
                .unwrap_or_else(|_| "logs/aemo_report.log".to_string()),
            console_filter: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| DEFAULT_CONSOLE_FILTER.to_string()),
            file_filter: std::env::var("RUST_LOG_JSON")
                .unwrap_or_else(|_| DEFAULT_FILE_FILTER.to_string()),
        }
    }
}

/// Parses `directives`, falling back to `default` when they are malformed.
/// The parse error is handed back so it can be logged once logging is up.
pub fn env_filter(directives: &str, default: &str) -> (EnvFilter, Option<ParseError>) {
    match EnvFilter::try_new(directives) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(default), Some(e)),
    }
}

/// Installs the global subscriber. Keep the returned guard alive for the
/// whole run or buffered file output is lost.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<WorkerGuard> {
    let log_path = Path::new(&config.log_file_path);
    let log_dir = log_path.parent().unwrap_or(Path::new("logs"));
    let log_file_name = log_path
        .file_name()
        .unwrap_or(OsStr::new("aemo_report.log"));

    let (console_filter, console_err) = env_filter(&config.console_filter, DEFAULT_CONSOLE_FILTER);
    let (file_filter, file_err) = env_filter(&config.file_filter, DEFAULT_FILE_FILTER);

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stdout)
        .with_filter(console_filter);

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(file_filter);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(json_layer)
        .try_init()?;

    if let Some(e) = console_err {
        warn!(directives = %config.console_filter, error = %e, "Ignoring invalid RUST_LOG");
    }
    if let Some(e) = file_err {
        warn!(directives = %config.file_filter, error = %e, "Ignoring invalid RUST_LOG_JSON");
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_valid_filter_is_used() {
        let (filter, err) = env_filter("aemo_report=trace", DEFAULT_CONSOLE_FILTER);
        assert!(err.is_none());
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn test_malformed_filter_falls_back_to_default() {
        let (filter, err) = env_filter("aemo_report=loudest", DEFAULT_CONSOLE_FILTER);
        assert!(err.is_some());
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }
}

