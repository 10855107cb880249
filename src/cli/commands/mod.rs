//! CLI command implementations
//!
//! Exit codes shared by all commands: 0 success, 2 configuration error,
//! 4 repository connection error, 5 fatal error, 130 cancelled.

pub mod export;
pub mod init;
pub mod status;
pub mod validate;

/// Success, including cache-only runs
pub const EXIT_OK: i32 = 0;
/// Invalid or missing configuration
pub const EXIT_CONFIG: i32 = 2;
/// Repository unreachable or credentials rejected
pub const EXIT_CONNECTION: i32 = 4;
/// Run aborted by an error
pub const EXIT_FATAL: i32 = 5;
/// Run cancelled by a signal
pub const EXIT_CANCELLED: i32 = 130;
