//! Logging for the criticat binaries
//!
//! Each run appends to a daily-rotated file under `$XDG_STATE_HOME/criticat/`
//! (`criticat.log.YYYY-MM-DD`). Stdout is left to the run summaries; with
//! `-v`, warnings about skipped conversations and failed metrics are also
//! mirrored to stderr.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Prefix of the rotated log files.
pub const LOG_FILE_PREFIX: &str = "criticat.log";

/// `RUST_LOG` when set, otherwise `level`.
fn env_or_level(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Start logging into the XDG state directory.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<LoggingGuard> {
    init_in(&Config::state_dir(), config, verbose)
}

/// Start logging into `log_dir`.
///
/// Fails if a global subscriber is already installed.
pub fn init_in(log_dir: &Path, config: &LoggingConfig, verbose: bool) -> Result<LoggingGuard> {
    std::fs::create_dir_all(log_dir)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (writer, worker) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(env_or_level(&config.level))
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("logging already initialized: {}", e)))?;

    tracing::info!(
        log_dir = %log_dir.display(),
        level = %config.level,
        verbose,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        log_dir: log_dir.to_path_buf(),
        _worker: worker,
    })
}

/// Send logs to the test harness; `RUST_LOG` overrides the `warn` default.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_or_level("warn"))
        .with_test_writer()
        .try_init();
}

/// Flushes pending log lines when dropped; keep it alive for the whole run.
pub struct LoggingGuard {
    log_dir: PathBuf,
    _worker: WorkerGuard,
}

impl LoggingGuard {
    /// Directory receiving the rotated log files.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}
