//! Tracing subscriber setup

use std::fs;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_NAME: &str = "chop.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Daily-rolling file; the terminal owns stdout.
    File(PathBuf),
    Stderr,
    Off,
}

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered file output gets flushed.
pub fn init(target: LogTarget, level: &str) -> Option<WorkerGuard> {
    if level.eq_ignore_ascii_case("none") || target == LogTarget::Off {
        return None;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match target {
        LogTarget::File(dir) => {
            if let Err(err) = fs::create_dir_all(&dir) {
                eprintln!("Warning: failed to create log directory {}: {err}", dir.display());
                return None;
            }
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false);
            let installed = tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .try_init()
                .is_ok();
            if installed {
                tracing::info!(log_dir = %dir.display(), level, "logging initialized");
            }
            Some(guard)
        }
        LogTarget::Stderr => {
            let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .try_init();
            None
        }
        LogTarget::Off => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_level_disables_logging() {
        let dir = tempfile::tempdir().unwrap();
        assert!(init(LogTarget::File(dir.path().to_path_buf()), "none").is_none());
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
