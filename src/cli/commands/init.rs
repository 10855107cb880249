//! Init command implementation
//!
//! Writes a commented sample configuration file.

use super::{EXIT_CONFIG, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "bulk-export.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        if let Err(e) = fs::write(&self.output, sample_config()) {
            println!("❌ Failed to write configuration file: {e}");
            return Ok(EXIT_CONFIG);
        }

        println!("✅ Configuration file created: {}", self.output);
        println!();
        println!("Next steps:");
        println!("  1. Set repository.base_url and export.root_node in {}", self.output);
        println!("  2. Put the repository password in BULK_EXPORT_PASSWORD (or a .env file)");
        println!("  3. Run: bulk-export validate-config");
        println!("  4. Run: bulk-export export");

        Ok(EXIT_OK)
    }
}

/// Sample configuration with every option shown
pub fn sample_config() -> &'static str {
    r#"# Bulk export configuration
#
# ${VAR} references are replaced from the environment (and .env).
# Any key can also be overridden with BULK_EXPORT_<SECTION>_<KEY>,
# e.g. BULK_EXPORT_EXPORT_ROOT_NODE.

[application]
# trace, debug, info, warn or error
log_level = "info"

[repository]
base_url = "http://localhost:8080"
username = "admin"
password = "${BULK_EXPORT_PASSWORD}"
timeout_seconds = 60
tls_verify = true

[repository.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

[export]
# Export directory; also holds the node-list cache and completion journal
base_path = "./export"
# Id of the folder to export
root_node = "REPLACE-WITH-ROOT-NODE-ID"
# Set either date to select modified nodes below the root in one query
# from_date = "2024-01-01"
# to_date = "2024-12-31"
# Export every revision of versioned nodes
export_versions = false
# Keep the .v<label> suffix on the head revision
revision_head = false
# Only build the node-list cache, then stop
use_node_cache = false
# Leave files that already exist alone
skip_existing = false

[metadata]
# Aspects added to every metadata document
# custom_aspects = ["acme:migrated"]

# Extra properties; a value naming an existing property copies it
# [metadata.custom_properties]
# "acme:source" = "legacy-dms"
# "acme:originalName" = "cm:name"

# Exact renames of types, aspects and properties
# [metadata.rename]
# "cm:content" = "acme:document"

# Prefix rewrites, applied in order
# [[metadata.prefix_remap]]
# from = "cm:"
# to = "acme:"

[logging]
local_enabled = true
local_path = "./logs"
# daily, hourly or never
local_rotation = "daily"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BulkExportConfig;
    use tempfile::TempDir;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "bulk-export.toml".to_string(),
            force: false,
        };
        assert_eq!(args.output, "bulk-export.toml");
        assert!(!args.force);
    }

    #[test]
    fn test_sample_config_is_valid() {
        let config: BulkExportConfig = toml::from_str(sample_config()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.export.root_node, "REPLACE-WITH-ROOT-NODE-ID");
        assert!(config.export.from_date.is_none());
        assert!(config.metadata.is_empty());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("bulk-export.toml");
        fs::write(&output, "keep me").unwrap();

        let args = InitArgs {
            output: output.display().to_string(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "keep me");

        let args = InitArgs {
            output: output.display().to_string(),
            force: true,
        };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert_eq!(fs::read_to_string(&output).unwrap(), sample_config());
    }
}
