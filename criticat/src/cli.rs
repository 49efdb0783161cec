//! Startup shared by the criticat binaries.

use anyhow::{Context, Result};
use criticat_core::logging::LoggingGuard;
use criticat_core::Config;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Load configuration (explicit path or XDG default) and start logging.
pub fn init(config_path: Option<&Path>, verbose: bool) -> Result<(Config, LoggingGuard)> {
    Config::ensure_xdg_env();

    let config =
        Config::load_or_default_path(config_path).context("failed to load configuration")?;

    let log_guard = criticat_core::logging::init(&config.logging, verbose)
        .context("failed to initialize logging")?;
    if verbose {
        eprintln!("Logging to {}", log_guard.log_dir().display());
    }

    Ok((config, log_guard))
}

/// Command-line value if given, otherwise the configured one.
pub fn resolve(flag: Option<PathBuf>, configured: &Path) -> PathBuf {
    flag.unwrap_or_else(|| configured.to_path_buf())
}

/// Progress bar driven by the `(index, total, conversation_id)` callbacks.
pub fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Advance `pb` for one conversation.
pub fn tick(pb: &ProgressBar, current: usize, total: usize, conversation_id: &str) {
    if current == 0 {
        pb.set_length(total as u64);
    }
    pb.set_position(current as u64);
    pb.set_message(conversation_id.to_string());
}
