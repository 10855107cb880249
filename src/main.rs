// Bulk Export - Versioned content repository to file system exporter
// Copyright (c) 2025 Bulk Export Contributors
// Licensed under the MIT License

use bulk_export::cli::{Cli, Commands};
use bulk_export::config::{read_config, LoggingConfig};
use bulk_export::logging::init_logging;
use clap::Parser;
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // File logging follows the config when it can be read; otherwise the
    // command reports the config problem itself over console logging.
    let (config_level, logging_config) = match read_config(&cli.config) {
        Ok(config) if matches!(cli.command, Commands::Export(_)) => {
            (Some(config.application.log_level), config.logging)
        }
        Ok(config) => (
            Some(config.application.log_level),
            LoggingConfig {
                local_enabled: false,
                ..config.logging
            },
        ),
        Err(_) => (
            None,
            LoggingConfig {
                local_enabled: false,
                ..LoggingConfig::default()
            },
        ),
    };
    let log_level = cli
        .log_level
        .clone()
        .or(config_level)
        .unwrap_or_else(|| "info".to_string());

    // Level and log directory come from configuration.
    let guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(2);
        }
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Bulk Export");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown().await;
        println!("\n⚠️  Shutdown signal received, finishing the current node...");
        let _ = shutdown_tx.send(true);
    });

    let exit_code = match execute_command(&cli, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    // process::exit skips destructors
    drop(guard);
    process::exit(exit_code);
}

/// Resolves on SIGINT, or SIGTERM on unix
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received SIGINT (Ctrl+C), requesting cancellation");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, requesting cancellation");
                    }
                }
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler; only Ctrl+C cancels");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received SIGINT (Ctrl+C), requesting cancellation"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Export(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Status(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
