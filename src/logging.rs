//! Logging setup
//!
//! Stderr gets the configured level (default `info`, `RUST_LOG` respected);
//! an optional session file in the user cache directory gets DEBUG-level
//! output for post-mortem debugging of editor sessions. Old session files
//! are removed on startup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use time::UtcOffset;
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_RETENTION_DAYS: u64 = 7;

/// Log directory in the user-specific OS cache directory:
/// - Linux: `~/.cache/emmet-language-server/`
/// - macOS: `~/Library/Caches/emmet-language-server/`
/// - Windows: `%LOCALAPPDATA%\emmet-language-server\`
fn log_dir() -> io::Result<PathBuf> {
    let mut dir = dirs::cache_dir().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "unable to determine user cache directory",
        )
    })?;
    dir.push("emmet-language-server");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Remove session logs older than `LOG_RETENTION_DAYS`.
fn cleanup_old_logs(dir: &Path) {
    let now = std::time::SystemTime::now();
    let retention = std::time::Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60);

    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !(name.starts_with("session-") && name.ends_with(".log")) {
            continue;
        }
        let expired = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age > retention);
        if expired {
            if let Err(err) = fs::remove_file(entry.path()) {
                eprintln!("Failed to remove old log file {:?}: {}", entry.path(), err);
            }
        }
    }
}

/// Initialize the logger.
///
/// Returns a guard for the non-blocking file writer that must be kept alive
/// for the duration of the program, or `None` when file logging is disabled
/// or the log directory is unavailable.
///
/// # Arguments
/// * `no_color` - Disable ANSI colors in stderr output
/// * `log_level` - Override the stderr level (otherwise `RUST_LOG` or `info`)
/// * `file_logging` - Write a DEBUG-level session file to the cache directory
pub fn init_logger(
    no_color: bool,
    log_level: Option<&str>,
    file_logging: bool,
) -> io::Result<Option<WorkerGuard>> {
    let timer = fmt::time::OffsetTime::new(
        UtcOffset::UTC,
        format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        ),
    );

    let stderr_filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(timer.clone())
        .with_ansi(!no_color)
        .with_filter(stderr_filter);

    let file = if file_logging {
        match log_dir() {
            Ok(dir) => {
                cleanup_old_logs(&dir);
                let timestamp = time::OffsetDateTime::now_utc()
                    .format(&format_description!("[year][month][day]-[hour][minute][second]"))
                    .map_err(io::Error::other)?;
                let path = dir.join(format!("session-{}-{}.log", timestamp, std::process::id()));
                let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
                eprintln!("Logging to file: {:?}", path);
                Some(file)
            }
            Err(err) => {
                eprintln!("File logging disabled: {}", err);
                None
            }
        }
    } else {
        None
    };

    let (file_layer, guard) = match file {
        Some(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_timer(timer)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
    if let Err(err) = result {
        // A subscriber may already be installed when the server is embedded
        // in another process; anything else is propagated.
        if !err.to_string().contains("already been set") {
            return Err(io::Error::other(err));
        }
    }

    Ok(guard)
}
