//! CLI interface and argument parsing
//!
//! This module provides the command-line interface using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Bulk Export - mirror a content repository onto the file system
#[derive(Parser, Debug)]
#[command(name = "bulk-export")]
#[command(version, about, long_about = None)]
#[command(author = "Bulk Export Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "bulk-export.toml", env = "BULK_EXPORT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "BULK_EXPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export (or resume exporting) the configured scope
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show node-list cache and journal counts for the configured scope
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from(["bulk-export", "export"]);
        assert_eq!(cli.config, "bulk-export.toml");
        assert!(matches!(cli.command, Commands::Export(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["bulk-export", "--config", "custom.toml", "export"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_export_overrides() {
        let cli = Cli::parse_from([
            "bulk-export",
            "--log-level",
            "debug",
            "export",
            "--root-node",
            "abc",
            "--from-date",
            "2024-01-01",
            "--export-versions",
            "--prefix",
            "cm:=acme:",
            "--yes",
        ]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Commands::Export(args) = cli.command else {
            panic!("expected export command");
        };
        assert_eq!(args.root_node.as_deref(), Some("abc"));
        assert_eq!(args.from_date.as_deref(), Some("2024-01-01"));
        assert!(args.export_versions);
        assert!(!args.revision_head);
        assert_eq!(args.prefix.as_deref(), Some("cm:=acme:"));
        assert!(args.yes);
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["bulk-export", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["bulk-export", "status"]);
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["bulk-export", "init", "--force"]);
        let Commands::Init(args) = cli.command else {
            panic!("expected init command");
        };
        assert!(args.force);
        assert_eq!(args.output, "bulk-export.toml");
    }
}
