//! Result type alias for the exporter
//!
//! This module provides a convenient Result type alias that uses
//! `BulkExportError` as the error type.

use super::errors::BulkExportError;

/// Result type alias for exporter operations
///
/// # Examples
///
/// ```
/// use bulk_export::domain::result::Result;
/// use bulk_export::domain::errors::BulkExportError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(BulkExportError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, BulkExportError>;
