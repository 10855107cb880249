//! Integration tests for logging functionality
//!
//! A process can install only one global subscriber, so everything that
//! calls `init_logging` lives in a single test.

use bulk_export::config::LoggingConfig;
use bulk_export::logging::init_logging;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(config.local_enabled);
    assert_eq!(config.local_path, "./logs");
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_init_logging_creates_directory_once() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");
    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
    };

    assert!(init_logging("verbose", &config).is_err());
    assert!(!log_path.exists());

    let guard = init_logging("debug", &config).unwrap();
    assert!(log_path.is_dir());
    tracing::info!(node_id = "root", "Logging works");

    let err = init_logging("info", &config).err().unwrap();
    assert!(err.to_string().contains("logging subscriber"));
    drop(guard);
}
