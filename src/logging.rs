// Logging
// tracing subscriber setup: per-session log file plus console output

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_PREFIX: &str = "detectia_";
const LOGS_TO_KEEP: usize = 30;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE")
    )
}

/// Initialize logging with a timestamped log file per session.
///
/// `RUST_LOG` drives the filter (default `info`). `DETECTIA_LOG_DIR` overrides the
/// log directory, `DETECTIA_DISABLE_FILE_LOG` keeps output on the console only and
/// `DETECTIA_DISABLE_LOG_CLEANUP` keeps every old log file.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if env_flag("DETECTIA_DISABLE_FILE_LOG") {
        init_console_only_logging(env_filter);
        info!("File logging disabled via DETECTIA_DISABLE_FILE_LOG");
        return;
    }

    let logs_dir = match std::env::var("DETECTIA_LOG_DIR") {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => default_logs_dir(),
    };

    if let Err(e) = fs::create_dir_all(&logs_dir) {
        eprintln!("Failed to create logs directory {}: {}", logs_dir.display(), e);
        init_console_only_logging(env_filter);
        info!("Falling back to console-only logging (log dir not writable)");
        return;
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let log_filename = format!("{}{}.log", LOG_PREFIX, timestamp);

    let file_appender = rolling::never(&logs_dir, &log_filename);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(file_guard);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Console goes to stderr so JSON on stdout stays parseable
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .with_target(true);

    let init = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();
    if init.is_err() {
        return;
    }

    info!("=== Detectia Started ===");
    info!("Log file: {}", logs_dir.join(&log_filename).display());
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if !env_flag("DETECTIA_DISABLE_LOG_CLEANUP") {
        std::thread::spawn(move || {
            cleanup_old_logs(&logs_dir, LOGS_TO_KEEP);
        });
    }
}

fn default_logs_dir() -> PathBuf {
    #[cfg(debug_assertions)]
    {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("logs")
    }

    #[cfg(not(debug_assertions))]
    {
        if let Some(data_dir) = dirs::data_local_dir() {
            return data_dir.join("detectia").join("logs");
        }
        PathBuf::from("logs")
    }
}

/// Keep the `keep` most recent session logs, oldest removed first
pub fn cleanup_old_logs(logs_dir: &Path, keep: usize) -> usize {
    let mut entries: Vec<_> = match fs::read_dir(logs_dir) {
        Ok(rd) => rd.filter_map(|e| e.ok()).collect(),
        Err(_) => return 0,
    };

    entries.retain(|e| {
        let name = e.file_name().to_string_lossy().to_string();
        name.starts_with(LOG_PREFIX) && name.ends_with(".log")
    });

    if entries.len() <= keep {
        return 0;
    }

    // Session timestamps in the names sort chronologically
    entries.sort_by_key(|e| e.file_name());

    let remove_count = entries.len() - keep;
    entries
        .into_iter()
        .take(remove_count)
        .filter(|entry| fs::remove_file(entry.path()).is_ok())
        .count()
}

fn init_console_only_logging(env_filter: EnvFilter) {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}
