//! Validate config command implementation
//!
//! Loads and validates the configuration file and prints a summary of the
//! job it describes. Never contacts the repository.

use super::{EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Repository: {}", config.repository.base_url);
        println!(
            "  User: {}",
            config.repository.username.as_deref().unwrap_or("(anonymous)")
        );
        println!("  TLS Verify: {}", config.repository.tls_verify);
        println!("  Max Retries: {}", config.repository.retry.max_retries);
        println!("  Root Node: {}", config.export.root_node);
        println!("  Export Path: {}", config.export.base_path);
        match config.export.date_range() {
            Ok(Some(range)) => println!("  Modified: {range}"),
            _ => println!("  Selection: full descent"),
        }
        println!("  Export Versions: {}", config.export.export_versions);
        println!("  Revision Head Suffix: {}", config.export.revision_head);
        println!("  Node Cache Only: {}", config.export.use_node_cache);
        println!("  Skip Existing: {}", config.export.skip_existing);
        if !config.metadata.is_empty() {
            println!(
                "  Metadata Rules: {} aspect(s), {} propert(y/ies), {} rename(s), {} prefix rewrite(s)",
                config.metadata.custom_aspects.len(),
                config.metadata.custom_properties.len(),
                config.metadata.rename.len(),
                config.metadata.prefix_remap.len()
            );
        }
        println!(
            "  Local Logs: {}",
            if config.logging.local_enabled {
                config.logging.local_path.as_str()
            } else {
                "disabled"
            }
        );

        Ok(EXIT_OK)
    }
}
