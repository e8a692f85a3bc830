//! Tracing configuration and log routing.
//!
//! Logs go to stdout through a compact formatter and, without ANSI colours, to a log file.
//! The file path comes from [`Config::log_file`](crate::config::Config::log_file), which
//! `load_config` fills from `DOCQA_LOG_FILE`; without it the server appends to
//! `logs/docqa.log`. File output goes through a non-blocking writer so request handlers never
//! wait on disk.
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log file used when `DOCQA_LOG_FILE` is not set.
pub const DEFAULT_LOG_FILE: &str = "logs/docqa.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber. Call once, after configuration has been loaded.
///
/// `log_file` is the `DOCQA_LOG_FILE` override carried by `Config`; `None` selects
/// [`DEFAULT_LOG_FILE`]. Filtering follows `RUST_LOG` and defaults to `info`. When the log file
/// cannot be prepared the server still starts and logs to stdout only.
pub fn init_tracing(log_file: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    let path = log_file.unwrap_or(DEFAULT_LOG_FILE);
    match file_writer(Path::new(path)) {
        Ok(writer) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .compact();
            registry.with(file_layer).init();
        }
        Err(err) => {
            registry.init();
            tracing::warn!(path, error = %err, "Log file unavailable, logging to stdout only");
        }
    }
}

fn file_writer(path: &Path) -> io::Result<NonBlocking> {
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name"))?;
    std::fs::create_dir_all(directory)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(directory)
        .map_err(io::Error::other)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Ok(non_blocking)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_creates_missing_log_directory() {
        let root = tempfile::tempdir().expect("temp dir");
        let path = root.path().join("nested").join("docqa.log");

        file_writer(&path).expect("file writer");
        assert!(path.parent().expect("parent").is_dir());
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        let error = file_writer(Path::new("/")).expect_err("no file name");
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }
}
