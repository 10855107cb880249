//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - Human-readable console output
//! - Configurable log levels (`RUST_LOG` wins when set)
//! - Local JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use bulk_export::logging::init_logging;
//! use bulk_export::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(node_id = "root", "Export started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use bulk_export::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, 2000u64, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying request after error"
        );
    };
}
