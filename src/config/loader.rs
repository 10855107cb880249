//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::BulkExportConfig;
use super::secret_string;
use crate::domain::errors::BulkExportError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads and validates configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into BulkExportConfig
/// 4. Applies environment variable overrides (BULK_EXPORT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns `BulkExportError::Configuration` if the file is missing or
/// unreadable, a referenced variable is unset, the TOML is malformed, or
/// validation fails.
///
/// # Examples
///
/// ```no_run
/// use bulk_export::config::load_config;
///
/// let config = load_config("bulk-export.toml").expect("Failed to load config");
/// println!("Exporting {}", config.export.root_node);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<BulkExportConfig> {
    let config = read_config(path)?;
    config.validate().map_err(|e| {
        BulkExportError::Configuration(format!("Configuration validation failed: {e}"))
    })?;
    Ok(config)
}

/// Steps 1 to 4 of [`load_config`], without validation
///
/// Used when command-line flags still have to be applied before the result
/// is validated.
pub fn read_config(path: impl AsRef<Path>) -> Result<BulkExportConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(BulkExportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        BulkExportError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: BulkExportConfig = toml::from_str(&contents)
        .map_err(|e| BulkExportError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| BulkExportError::Configuration(e.to_string()))?;
    let mut missing_vars: Vec<String> = Vec::new();

    let lines: Vec<String> = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }
            re.replace_all(line, |caps: &regex::Captures<'_>| {
                let name = &caps[1];
                std::env::var(name).unwrap_or_else(|_| {
                    if !missing_vars.iter().any(|v| v == name) {
                        missing_vars.push(name.to_string());
                    }
                    String::new()
                })
            })
            .into_owned()
        })
        .collect();

    if !missing_vars.is_empty() {
        return Err(BulkExportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn env_flag(name: &str, current: bool) -> bool {
    match std::env::var(name) {
        Ok(val) => val.parse().unwrap_or(current),
        Err(_) => current,
    }
}

/// Applies environment variable overrides using the BULK_EXPORT_* prefix
///
/// Variables follow the pattern `BULK_EXPORT_<SECTION>_<KEY>`, for example
/// `BULK_EXPORT_REPOSITORY_BASE_URL` or `BULK_EXPORT_EXPORT_ROOT_NODE`.
fn apply_env_overrides(config: &mut BulkExportConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("BULK_EXPORT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Repository overrides
    if let Ok(val) = std::env::var("BULK_EXPORT_REPOSITORY_BASE_URL") {
        config.repository.base_url = val;
    }
    if let Ok(val) = std::env::var("BULK_EXPORT_REPOSITORY_USERNAME") {
        config.repository.username = Some(val);
    }
    if let Ok(val) = std::env::var("BULK_EXPORT_REPOSITORY_PASSWORD") {
        config.repository.password = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("BULK_EXPORT_REPOSITORY_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.repository.timeout_seconds = secs;
        }
    }
    config.repository.tls_verify = env_flag(
        "BULK_EXPORT_REPOSITORY_TLS_VERIFY",
        config.repository.tls_verify,
    );

    // Export overrides
    if let Ok(val) = std::env::var("BULK_EXPORT_EXPORT_BASE_PATH") {
        config.export.base_path = val;
    }
    if let Ok(val) = std::env::var("BULK_EXPORT_EXPORT_ROOT_NODE") {
        config.export.root_node = val;
    }
    if let Ok(val) = std::env::var("BULK_EXPORT_EXPORT_FROM_DATE") {
        config.export.from_date = Some(val);
    }
    if let Ok(val) = std::env::var("BULK_EXPORT_EXPORT_TO_DATE") {
        config.export.to_date = Some(val);
    }
    config.export.export_versions = env_flag(
        "BULK_EXPORT_EXPORT_EXPORT_VERSIONS",
        config.export.export_versions,
    );
    config.export.revision_head = env_flag(
        "BULK_EXPORT_EXPORT_REVISION_HEAD",
        config.export.revision_head,
    );
    config.export.use_node_cache = env_flag(
        "BULK_EXPORT_EXPORT_USE_NODE_CACHE",
        config.export.use_node_cache,
    );
    config.export.skip_existing = env_flag(
        "BULK_EXPORT_EXPORT_SKIP_EXISTING",
        config.export.skip_existing,
    );

    // Logging overrides
    config.logging.local_enabled = env_flag(
        "BULK_EXPORT_LOGGING_LOCAL_ENABLED",
        config.logging.local_enabled,
    );
    if let Ok(val) = std::env::var("BULK_EXPORT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("BULK_EXPORT_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("BX_LOADER_TEST_PASSWORD", "hunter2");
        let result = substitute_env_vars("password = \"${BX_LOADER_TEST_PASSWORD}\"").unwrap();
        assert_eq!(result, "password = \"hunter2\"");
        std::env::remove_var("BX_LOADER_TEST_PASSWORD");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("BX_LOADER_TEST_MISSING");
        let err = substitute_env_vars("a = \"${BX_LOADER_TEST_MISSING}\"").unwrap_err();
        assert!(err.to_string().contains("BX_LOADER_TEST_MISSING"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("BX_LOADER_TEST_COMMENTED");
        let input = "# password = \"${BX_LOADER_TEST_COMMENTED}\"\nlevel = \"info\"";
        assert_eq!(substitute_env_vars(input).unwrap(), input);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("does-not-exist.toml");
        assert!(matches!(result, Err(BulkExportError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let file = write_config(
            r#"
[application]
log_level = "debug"

[repository]
base_url = "http://repo.example.com:8080"
username = "admin"
password = "admin"

[export]
base_path = "/srv/export"
root_node = "8f2105b4-daaf-4874-9e8a-2152569d109b"
from_date = "2024-01-01"
export_versions = true

[metadata]
custom_aspects = ["acme:migrated"]
rename = { "cm:title" = "acme:heading" }
prefix_remap = [{ from = "cm:", to = "acme:" }]

[metadata.custom_properties]
"acme:source" = "legacy"
"acme:origin" = "cm:creator"
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.repository.base_url, "http://repo.example.com:8080");
        assert_eq!(config.repository.retry.max_retries, 3);
        assert!(config.export.export_versions);
        assert_eq!(config.metadata.custom_aspects, vec!["acme:migrated"]);
        assert_eq!(
            config.metadata.rename.get("cm:title").map(String::as_str),
            Some("acme:heading")
        );
        assert_eq!(config.metadata.prefix_remap.len(), 1);
        assert_eq!(config.metadata.custom_properties.len(), 2);
        assert!(config.logging.local_enabled);
    }

    #[test]
    fn test_read_config_does_not_validate() {
        let file = write_config(
            r#"
[repository]
base_url = "http://localhost:8080"

[export]
"#,
        );

        let config = read_config(file.path()).unwrap();
        assert!(config.export.root_node.is_empty());
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[repository\nbase_url = 1");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }
}
