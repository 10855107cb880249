//! Status command implementation
//!
//! Reports the persisted state of the configured job: the cached node list
//! and the completion journal. Reads local files only.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use crate::config::{load_config, BulkExportConfig};
use crate::core::state::{CompletionJournal, NodeListCache};
use crate::domain::{BulkExportError, CacheKey, JobScope, NodeId, Result};
use clap::Args;
use std::collections::HashSet;
use std::path::Path;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {}

/// Persisted progress of one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub cache_key: CacheKey,
    /// Size of the cached node list, if one exists
    pub cached: Option<usize>,
    /// Distinct journaled nodes
    pub completed: usize,
}

impl JobStatus {
    /// Cached nodes not yet journaled
    pub fn remaining(&self) -> Option<usize> {
        self.cached.map(|n| n.saturating_sub(self.completed))
    }
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking export status");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let status = match job_status(&config) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read job state");
                eprintln!("Failed to read job state: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        println!("📊 Export Status");
        println!();
        println!("Job: {}", status.cache_key);
        println!("  Export path: {}", config.export.base_path);
        match status.cached {
            Some(total) => println!("  Cached nodes: {total}"),
            None => println!("  Cached nodes: (no node list yet)"),
        }
        println!("  Completed: {}", status.completed);
        if let Some(remaining) = status.remaining() {
            println!("  Remaining: {remaining}");
            if remaining == 0 {
                println!();
                println!("✅ Every cached node has been exported");
            }
        }

        Ok(EXIT_OK)
    }
}

/// Reads the cache and journal for the configured scope
///
/// The key of a date-filtered scope does not depend on the root's path, so
/// the repository is never consulted.
pub fn job_status(config: &BulkExportConfig) -> Result<JobStatus> {
    let root = config.export.root().map_err(BulkExportError::Configuration)?;
    let scope = match config
        .export
        .date_range()
        .map_err(BulkExportError::Configuration)?
    {
        None => JobScope::Descent { root },
        Some(range) => JobScope::Modified {
            root,
            path: String::new(),
            range,
        },
    };
    let cache_key = CacheKey::for_scope(&scope);
    let dir = Path::new(&config.export.base_path);

    let cached = NodeListCache::new(dir).get(&cache_key)?.map(|ids| ids.len());
    let completed: HashSet<NodeId> = CompletionJournal::inspect(dir, &cache_key)
        .load()?
        .into_iter()
        .collect();

    tracing::debug!(
        cache_key = %cache_key,
        cached = ?cached,
        completed = completed.len(),
        "Job state read"
    );

    Ok(JobStatus {
        cache_key,
        cached,
        completed: completed.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApplicationConfig, ExportConfig, LoggingConfig, RepositoryConfig};
    use crate::core::transform::MetadataRules;
    use tempfile::TempDir;

    fn config(dir: &Path, from_date: Option<&str>) -> BulkExportConfig {
        BulkExportConfig {
            application: ApplicationConfig::default(),
            repository: RepositoryConfig::default(),
            export: ExportConfig {
                base_path: dir.display().to_string(),
                root_node: "root".to_string(),
                from_date: from_date.map(String::from),
                ..Default::default()
            },
            metadata: MetadataRules::default(),
            logging: LoggingConfig::default(),
        }
    }

    fn ids(names: &[&str]) -> Vec<NodeId> {
        names.iter().map(|n| NodeId::new(*n).unwrap()).collect()
    }

    #[test]
    fn test_status_without_state() {
        let dir = TempDir::new().unwrap();
        let status = job_status(&config(dir.path(), None)).unwrap();
        assert_eq!(status.cache_key.as_str(), "root");
        assert_eq!(status.cached, None);
        assert_eq!(status.completed, 0);
        assert_eq!(status.remaining(), None);
    }

    #[test]
    fn test_status_counts_cache_and_journal() {
        let dir = TempDir::new().unwrap();
        let key = CacheKey::new("FROM-2024-01-01").unwrap();
        NodeListCache::new(dir.path())
            .put(&key, &ids(&["a", "b", "c"]))
            .unwrap();
        let mut journal = CompletionJournal::open(dir.path(), &key).unwrap();
        for id in ids(&["a", "b", "a"]) {
            journal.append(&id).unwrap();
        }

        let status = job_status(&config(dir.path(), Some("2024-01-01"))).unwrap();
        assert_eq!(status.cache_key, key);
        assert_eq!(status.cached, Some(3));
        assert_eq!(status.completed, 2);
        assert_eq!(status.remaining(), Some(1));
    }
}
