//! Export command implementation
//!
//! Runs (or resumes) one export job against the configured repository and
//! maps the run report to an exit code.

use super::{EXIT_CANCELLED, EXIT_CONFIG, EXIT_CONNECTION, EXIT_FATAL, EXIT_OK};
use crate::adapters::{AlfrescoRepository, ContentRepository};
use crate::config::{read_config, BulkExportConfig};
use crate::core::export::{ExportDriver, ExportJob, ExportReport, RunStatus};
use crate::core::transform::{parse_list, parse_pairs, PrefixRemap};
use crate::domain::{BulkExportError, JobScope};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// How often the running job's counters are logged
const PROGRESS_INTERVAL: Duration = Duration::from_secs(30);

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Override the root node id
    #[arg(long)]
    pub root_node: Option<String>,

    /// Only export nodes modified at or after this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub from_date: Option<String>,

    /// Only export nodes modified at or before this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub to_date: Option<String>,

    /// Export every revision of versioned nodes
    #[arg(long)]
    pub export_versions: bool,

    /// Keep the revision suffix on the head revision
    #[arg(long)]
    pub revision_head: bool,

    /// Stop after generating the node-list cache
    #[arg(long)]
    pub use_node_cache: bool,

    /// Leave already exported files alone
    #[arg(long)]
    pub skip_existing: bool,

    /// Extra aspects added to every metadata document (comma-separated)
    #[arg(long, value_name = "ASPECTS")]
    pub aspects: Option<String>,

    /// Extra properties as name=value pairs (comma-separated)
    #[arg(long, value_name = "PAIRS")]
    pub properties: Option<String>,

    /// Type, aspect and property renames as old=new pairs (comma-separated)
    #[arg(long, value_name = "PAIRS")]
    pub rename: Option<String>,

    /// Namespace prefix rewrites as from=to pairs (comma-separated)
    #[arg(long, value_name = "PAIRS")]
    pub prefix: Option<String>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match read_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Err(e) = self.apply_overrides(&mut config) {
            tracing::error!(error = %e, "Invalid command line override");
            eprintln!("Invalid option: {e}");
            return Ok(EXIT_CONFIG);
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        if config.export.revision_head && !config.export.export_versions {
            tracing::warn!("revision_head has no effect unless export_versions is set");
        }

        if !self.yes && !confirm(&config)? {
            println!("Export cancelled.");
            return Ok(EXIT_OK);
        }

        let repository = match AlfrescoRepository::new(config.repository.clone()) {
            Ok(r) => Arc::new(r),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create repository client");
                eprintln!("Failed to initialize repository client: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let scope = match build_scope(&config, repository.as_ref()).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to resolve export scope");
                eprintln!("Failed to resolve export scope: {e}");
                return Ok(if e.is_connection() {
                    EXIT_CONNECTION
                } else {
                    EXIT_FATAL
                });
            }
        };

        let job = Arc::new(ExportJob::new(ExportJob::id_for_scope(&scope)));
        let forwarder = spawn_cancel_forwarder(Arc::clone(&job), shutdown_signal);
        let poller = spawn_progress_logger(Arc::clone(&job));

        println!("🚀 Starting export...");
        println!();

        let driver = ExportDriver::new(repository, config.to_settings(), job);
        let report = driver.run(&scope).await;

        poller.abort();
        forwarder.abort();

        println!();
        println!("📊 Export Summary:");
        print!("{report}");
        println!();

        let exit_code = exit_code_for(&report);
        match report.status {
            RunStatus::Completed => println!("✅ Export completed successfully!"),
            RunStatus::CacheGenerated => {
                println!("✅ Node list cached. Run again without --use-node-cache to export.")
            }
            RunStatus::Cancelled => {
                println!("⚠️  Export cancelled. Completed nodes are journaled.");
                println!("   Run the same command to resume.");
            }
            RunStatus::Failed => println!("❌ Export failed"),
        }

        Ok(exit_code)
    }

    /// Folds command line options into the loaded configuration
    fn apply_overrides(&self, config: &mut BulkExportConfig) -> Result<(), String> {
        if let Some(root) = &self.root_node {
            tracing::info!(root_node = %root, "Overriding root node from CLI");
            config.export.root_node = root.clone();
        }
        if let Some(from) = &self.from_date {
            config.export.from_date = Some(from.clone());
        }
        if let Some(to) = &self.to_date {
            config.export.to_date = Some(to.clone());
        }

        config.export.export_versions |= self.export_versions;
        config.export.revision_head |= self.revision_head;
        config.export.use_node_cache |= self.use_node_cache;
        config.export.skip_existing |= self.skip_existing;

        let metadata = &mut config.metadata;
        if let Some(aspects) = &self.aspects {
            metadata.custom_aspects = parse_list(aspects);
        }
        if let Some(properties) = &self.properties {
            metadata.custom_properties = parse_pairs(properties)?.into_iter().collect();
        }
        if let Some(rename) = &self.rename {
            metadata.rename = parse_pairs(rename)?.into_iter().collect();
        }
        if let Some(prefix) = &self.prefix {
            metadata.prefix_remap = parse_pairs(prefix)?
                .into_iter()
                .map(|(from, to)| PrefixRemap { from, to })
                .collect();
        }
        Ok(())
    }
}

fn confirm(config: &BulkExportConfig) -> anyhow::Result<bool> {
    use std::io::{self, Write};

    println!("Export Configuration:");
    println!("  Repository: {}", config.repository.base_url);
    println!("  Root node: {}", config.export.root_node);
    println!("  Export path: {}", config.export.base_path);
    println!(
        "  From: {}",
        config.export.from_date.as_deref().unwrap_or("-")
    );
    println!("  To: {}", config.export.to_date.as_deref().unwrap_or("-"));
    println!("  Versions: {}", config.export.export_versions);
    println!("  Node cache only: {}", config.export.use_node_cache);
    println!("  Skip existing: {}", config.export.skip_existing);
    println!();
    print!("Proceed with export? [y/N]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Resolves the configured root and date range into a job scope
///
/// A date-filtered scope needs the root's display path, which costs one
/// repository call.
pub async fn build_scope(
    config: &BulkExportConfig,
    repository: &dyn ContentRepository,
) -> crate::domain::Result<JobScope> {
    let root = config.export.root().map_err(BulkExportError::Configuration)?;
    match config
        .export
        .date_range()
        .map_err(BulkExportError::Configuration)?
    {
        None => Ok(JobScope::Descent { root }),
        Some(range) => {
            let path = repository.path(&root).await?;
            Ok(JobScope::Modified { root, path, range })
        }
    }
}

/// Exit code for a finished run
pub fn exit_code_for(report: &ExportReport) -> i32 {
    match report.status {
        RunStatus::Completed | RunStatus::CacheGenerated => EXIT_OK,
        RunStatus::Cancelled => EXIT_CANCELLED,
        RunStatus::Failed => match &report.error {
            Some(e) if e.is_connection() => EXIT_CONNECTION,
            _ => EXIT_FATAL,
        },
    }
}

fn spawn_cancel_forwarder(
    job: Arc<ExportJob>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if *shutdown.borrow() {
                tracing::info!(job_id = %job.job_id(), "Cancellation requested");
                job.request_cancel();
                return;
            }
            if shutdown.changed().await.is_err() {
                return;
            }
        }
    })
}

fn spawn_progress_logger(job: Arc<ExportJob>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
        // First tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let progress = job.progress();
            tracing::info!(
                job_id = %job.job_id(),
                total = progress.total_candidates,
                remaining = progress.remaining_candidates,
                previously_completed = progress.previously_completed,
                exported = progress.exported,
                "Export progress"
            );
        }
    })
}
