//! File logging runs in its own test binary: the subscriber is process-global.

use criticat_core::config::LoggingConfig;
use criticat_core::logging::{init_in, LOG_FILE_PREFIX};
use tempfile::TempDir;

#[test]
fn test_init_in_writes_rotated_log_file() {
    let dir = TempDir::new().unwrap();
    let log_dir = dir.path().join("state/criticat");
    let config = LoggingConfig {
        level: "info".to_string(),
    };

    let guard = init_in(&log_dir, &config, false).expect("logging should start");
    assert_eq!(guard.log_dir(), log_dir.as_path());
    tracing::warn!(conversation = "B05", "Metric failed");

    // Dropping the guard flushes the background writer
    drop(guard);

    let files: Vec<_> = std::fs::read_dir(&log_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(LOG_FILE_PREFIX))
        .collect();
    assert_eq!(files.len(), 1);

    let content = std::fs::read_to_string(log_dir.join(&files[0])).unwrap();
    assert!(content.contains("Metric failed"));
    assert!(content.contains("B05"));

    // A second subscriber cannot be installed
    assert!(init_in(&log_dir, &config, false).is_err());
}
