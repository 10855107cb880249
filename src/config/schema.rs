//! Configuration schema types
//!
//! This module defines the configuration structure of the exporter. Each
//! section validates itself; [`BulkExportConfig::validate`] runs them all.

use crate::config::SecretString;
use crate::core::export::ExportSettings;
use crate::core::transform::MetadataRules;
use crate::domain::{parse_date_bound, DateRange, NodeId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main exporter configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkExportConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Content repository connection
    pub repository: RepositoryConfig,

    /// What to export and where
    pub export: ExportConfig,

    /// Metadata rewriting rules
    #[serde(default)]
    pub metadata: MetadataRules,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BulkExportConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.repository.validate()?;
        self.export.validate()?;
        self.validate_metadata()?;
        self.logging.validate()?;
        Ok(())
    }

    fn validate_metadata(&self) -> Result<(), String> {
        if let Some(remap) = self.metadata.prefix_remap.iter().find(|r| r.from.is_empty()) {
            return Err(format!(
                "metadata.prefix_remap entry with target '{}' has an empty 'from' prefix",
                remap.to
            ));
        }
        if let Some((name, _)) = self.metadata.custom_properties.iter().find(|(k, _)| k.is_empty())
        {
            return Err(format!("metadata.custom_properties has an empty name ('{name}')"));
        }
        Ok(())
    }

    /// Engine settings for this configuration
    pub fn to_settings(&self) -> ExportSettings {
        let mut settings = ExportSettings::new(PathBuf::from(&self.export.base_path));
        settings.export_versions = self.export.export_versions;
        settings.revision_head = self.export.revision_head;
        settings.use_node_cache = self.export.use_node_cache;
        settings.skip_existing = self.export.skip_existing;
        settings.metadata = self.metadata.clone();
        settings
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 || self.max_retries > 10 {
            return Err(format!(
                "repository.retry.max_retries must be between 1 and 10, got {}",
                self.max_retries
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(format!(
                "repository.retry.backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Content repository connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Base URL of the repository server, e.g. `http://localhost:8080`
    pub base_url: String,

    /// Username for basic authentication
    #[serde(default)]
    pub username: Option<String>,

    /// Password for basic authentication
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// TLS certificate verification enabled
    ///
    /// Disabling it exposes the connection to man-in-the-middle attacks; only
    /// do so against test servers with self-signed certificates.
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl RepositoryConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err("repository.base_url cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("repository.base_url must start with http:// or https://".to_string());
        }

        let has_username = self.username.as_ref().is_some_and(|u| !u.is_empty());
        let has_password = self
            .password
            .as_ref()
            .is_some_and(|p| !p.expose_secret().is_empty());
        if has_username != has_password {
            return Err(
                "repository.username and repository.password must be given together".to_string(),
            );
        }

        if self.timeout_seconds == 0 {
            return Err("repository.timeout_seconds must be > 0".to_string());
        }

        self.retry.validate()
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            username: None,
            password: None,
            timeout_seconds: default_timeout_seconds(),
            tls_verify: true,
            retry: RetryConfig::default(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Export directory; also holds the node-list caches and journals
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Id of the node the export starts from
    #[serde(default)]
    pub root_node: String,

    /// Lower modification-date bound (`YYYY-MM-DD` or RFC 3339)
    #[serde(default)]
    pub from_date: Option<String>,

    /// Upper modification-date bound (`YYYY-MM-DD` or RFC 3339)
    #[serde(default)]
    pub to_date: Option<String>,

    /// Export every revision instead of the head only
    #[serde(default)]
    pub export_versions: bool,

    /// Keep the `.v<label>` suffix on the head revision
    #[serde(default)]
    pub revision_head: bool,

    /// Only generate the node-list cache when it does not exist yet
    #[serde(default)]
    pub use_node_cache: bool,

    /// Leave already exported files alone
    #[serde(default)]
    pub skip_existing: bool,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.base_path.trim().is_empty() {
            return Err("export.base_path cannot be empty".to_string());
        }

        if self.root_node.trim().is_empty() {
            return Err("export.root_node cannot be empty".to_string());
        }

        for (name, value) in [("from_date", &self.from_date), ("to_date", &self.to_date)] {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                parse_date_bound(value).map_err(|e| format!("export.{name}: {e}"))?;
            }
        }
        self.date_range()?;

        Ok(())
    }

    /// Root node id
    pub fn root(&self) -> Result<NodeId, String> {
        NodeId::new(self.root_node.trim())
            .map_err(|e| format!("export.root_node: {e}"))
    }

    /// Modification-date range, `None` for a full descent
    pub fn date_range(&self) -> Result<Option<DateRange>, String> {
        let has_bound = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !has_bound(&self.from_date) && !has_bound(&self.to_date) {
            return Ok(None);
        }
        DateRange::new(self.from_date.clone(), self.to_date.clone())
            .map(Some)
            .map_err(|e| format!("export: {e}"))
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            root_node: String::new(),
            from_date: None,
            to_date: None,
            export_versions: false,
            revision_head: false,
            use_node_cache: false,
            skip_existing: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_base_path() -> String {
    "./export".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
