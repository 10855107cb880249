//! Configuration management for the exporter.
//!
//! TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `BULK_EXPORT_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bulk_export::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("bulk-export.toml")?;
//!
//! println!("Repository: {}", config.repository.base_url);
//! println!("Root node: {}", config.export.root_node);
//! println!("Export path: {}", config.export.base_path);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`RepositoryConfig`] - Repository URL, credentials, timeouts, retries
//! - [`ExportConfig`] - Root node, date range, export switches
//! - [`MetadataRules`](crate::core::transform::MetadataRules) - Custom
//!   aspects and properties, renames, prefix rewrites
//! - [`LoggingConfig`] - Local JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [repository]
//! base_url = "http://localhost:8080"
//! username = "admin"
//! password = "${BULK_EXPORT_PASSWORD}"
//!
//! [export]
//! base_path = "/srv/export"
//! root_node = "8f2105b4-daaf-4874-9e8a-2152569d109b"
//! export_versions = true
//!
//! [metadata]
//! prefix_remap = [{ from = "cm:", to = "acme:" }]
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, read_config};
pub use schema::{
    ApplicationConfig, BulkExportConfig, ExportConfig, LoggingConfig, RepositoryConfig,
    RetryConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
