use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "meshpulse.log";
const LOG_RETENTION_DAYS: u64 = 7;

struct LocalTimer;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = chrono::Local::now();
        write!(w, "{}", now.to_rfc3339())
    }
}

pub fn get_log_dir(data_dir: &Path) -> Result<PathBuf, String> {
    let log_dir = data_dir.join("logs");

    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)
            .map_err(|e| format!("Failed to create log directory: {}", e))?;
    }

    Ok(log_dir)
}

/// Console plus daily-rolled file output. `RUST_LOG` overrides the default
/// `info` filter. Buffered file lines are flushed when the returned guard
/// is dropped.
pub fn init_logger(data_dir: &Path) -> Option<WorkerGuard> {
    let _ = tracing_log::LogTracer::init();

    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = fmt::Layer::new()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_timer(LocalTimer);

    let log_dir = match get_log_dir(data_dir) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to initialize log directory: {}", e);
            let _ = tracing_subscriber::registry()
                .with(filter_layer)
                .with(console_layer)
                .try_init();
            return None;
        }
    };

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::Layer::new()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_timer(LocalTimer);
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    info!("Log system initialized (Console + File persistence)");
    match cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS) {
        Ok(0) => {}
        Ok(deleted) => info!("Log cleanup completed: deleted {} files", deleted),
        Err(e) => warn!("Failed to cleanup old logs: {}", e),
    }
    Some(guard)
}

/// Deletes files in `log_dir` last modified more than `days_to_keep` days
/// ago. Returns how many were removed.
pub fn cleanup_old_logs(log_dir: &Path, days_to_keep: u64) -> Result<usize, String> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Failed to get system time: {}", e))?
        .as_secs();
    let cutoff_time = now.saturating_sub(days_to_keep * 24 * 60 * 60);

    let entries =
        fs::read_dir(log_dir).map_err(|e| format!("Failed to read log directory: {}", e))?;

    let mut deleted_count = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let modified_secs = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(now);

        if modified_secs >= cutoff_time {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                deleted_count += 1;
                info!("Deleted old log file (expired): {:?}", path.file_name());
            }
            Err(e) => warn!("Failed to delete old log file {:?}: {}", path, e),
        }
    }

    Ok(deleted_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{lock_env, temp_data_dir, ScopedEnvVar};

    #[test]
    fn log_dir_is_created_under_data_dir() {
        let dir = temp_data_dir("logdir");
        let log_dir = get_log_dir(&dir).unwrap();
        assert_eq!(log_dir, dir.join("logs"));
        assert!(log_dir.is_dir());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn dropping_guard_flushes_file_output() {
        let _lock = lock_env();
        let _filter = ScopedEnvVar::unset("RUST_LOG");
        let dir = temp_data_dir("flush");
        let guard = init_logger(&dir).expect("file logging enabled");

        info!("All auto claimers stopped");
        drop(guard);

        let written: String = fs::read_dir(dir.join("logs"))
            .unwrap()
            .flatten()
            .filter_map(|entry| fs::read_to_string(entry.path()).ok())
            .collect();
        assert!(written.contains("All auto claimers stopped"), "{}", written);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn cleanup_keeps_recent_files() {
        let dir = temp_data_dir("cleanup");
        let log_dir = get_log_dir(&dir).unwrap();
        fs::write(log_dir.join("meshpulse.log.2024-11-20"), "recent").unwrap();

        assert_eq!(cleanup_old_logs(&log_dir, 7).unwrap(), 0);
        assert!(log_dir.join("meshpulse.log.2024-11-20").exists());
        assert_eq!(cleanup_old_logs(&dir.join("missing"), 0).unwrap(), 0);
        let _ = fs::remove_dir_all(&dir);
    }
}
