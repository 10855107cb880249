//! Export driver - runs one export job end to end
//!
//! `Idle → Planning → (CacheGeneratedStop | Resuming) → Exporting →
//! {Completed | Cancelled | Failed}`
//!
//! Nodes are exported one at a time in resume-set order. A node is appended
//! to the completion journal only after its content and metadata (all
//! requested revisions) are written, so a failed or cancelled run can be
//! resumed with the same cache key.

use super::job::ExportJob;
use super::report::{ExportReport, RunStatus};
use super::writer::OutputTree;
use crate::adapters::repository::{ContentRepository, ContentStatus};
use crate::core::history::{export_targets, resolve_history};
use crate::core::state::journal::subtract;
use crate::core::state::{CompletionJournal, NodeListCache};
use crate::core::transform::{EmptyValuePolicy, MetadataRules, MetadataTransformer, RawMetadata};
use crate::core::traversal::{IgnoreRules, TraversalPlanner, PROGRESS_INTERVAL};
use crate::domain::{
    BulkExportError, CacheKey, JobScope, NodeId, NodeRecord, RepositoryError, Result,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Position of the driver in its state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Planning,
    CacheGeneratedStop,
    Resuming,
    Exporting,
    Completed,
    Cancelled,
    Failed,
}

/// Behavior switches of one export job
#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Export directory; also holds the node-list cache and journal
    pub base_path: PathBuf,
    /// Export every revision instead of the head only
    pub export_versions: bool,
    /// Keep the `.v<label>` suffix on the head revision
    pub revision_head: bool,
    /// Stop after generating a missing node-list cache
    pub use_node_cache: bool,
    /// Leave already exported files alone
    pub skip_existing: bool,
    pub ignore: IgnoreRules,
    pub metadata: MetadataRules,
}

impl ExportSettings {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            export_versions: false,
            revision_head: false,
            use_node_cache: false,
            skip_existing: false,
            ignore: IgnoreRules::standard(),
            metadata: MetadataRules::default(),
        }
    }
}

/// Mutable state that lives for one run
struct RunContext {
    policy: EmptyValuePolicy,
    warnings: Vec<String>,
}

/// Export driver
pub struct ExportDriver {
    repository: Arc<dyn ContentRepository>,
    settings: ExportSettings,
    job: Arc<ExportJob>,
    tree: OutputTree,
    transformer: MetadataTransformer,
    state: Mutex<ExportState>,
}

impl ExportDriver {
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        settings: ExportSettings,
        job: Arc<ExportJob>,
    ) -> Self {
        let tree = OutputTree::new(settings.base_path.clone(), settings.skip_existing);
        let transformer =
            MetadataTransformer::new(settings.ignore.clone(), settings.metadata.clone());
        Self {
            repository,
            settings,
            job,
            tree,
            transformer,
            state: Mutex::new(ExportState::Idle),
        }
    }

    pub fn job(&self) -> &Arc<ExportJob> {
        &self.job
    }

    pub fn state(&self) -> ExportState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ExportState) {
        tracing::debug!(job_id = %self.job.job_id(), state = ?state, "Export state change");
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Runs the job for `scope`
    ///
    /// Never returns an error: failures are reported through the returned
    /// report with `RunStatus::Failed` and the partial counts.
    pub async fn run(&self, scope: &JobScope) -> ExportReport {
        let start_time = Instant::now();
        let cache_key = CacheKey::for_scope(scope);
        let mut report = ExportReport::new(self.job.job_id(), cache_key.clone());
        let mut ctx = RunContext {
            policy: EmptyValuePolicy::new(),
            warnings: Vec::new(),
        };

        tracing::info!(
            job_id = %self.job.job_id(),
            cache_key = %cache_key,
            base_path = %self.settings.base_path.display(),
            "Starting export"
        );

        let status = match self.execute(scope, &cache_key, &mut report, &mut ctx).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(job_id = %self.job.job_id(), error = %e, "Export aborted");
                report.error = Some(e);
                RunStatus::Failed
            }
        };

        self.set_state(match status {
            RunStatus::Completed => ExportState::Completed,
            RunStatus::Cancelled => ExportState::Cancelled,
            RunStatus::CacheGenerated => ExportState::CacheGeneratedStop,
            RunStatus::Failed => ExportState::Failed,
        });

        report.status = status;
        report.exported = self.job.exported();
        report.warnings = ctx.warnings;
        report.duration = start_time.elapsed();
        report.log_summary();
        report
    }

    async fn execute(
        &self,
        scope: &JobScope,
        cache_key: &CacheKey,
        report: &mut ExportReport,
        ctx: &mut RunContext,
    ) -> Result<RunStatus> {
        // Planning
        self.set_state(ExportState::Planning);
        let cache = NodeListCache::new(&self.settings.base_path);
        let planner = TraversalPlanner::new(self.repository.clone(), self.settings.ignore.clone());
        let job = self.job.as_ref();

        let cached = cache
            .operate(cache_key, move || async move {
                let planned = planner.plan(scope, job).await?;
                Ok::<_, BulkExportError>((!planned.cancelled).then_some(planned.nodes))
            })
            .await?;

        let Some(cached) = cached else {
            report.total_candidates = self.job.total_candidates();
            return Ok(RunStatus::Cancelled);
        };

        let candidates = cached.nodes;
        self.job.set_total_candidates(candidates.len());
        report.total_candidates = candidates.len();

        if cached.generated && self.settings.use_node_cache {
            tracing::info!(
                cache_key = %cache_key,
                count = candidates.len(),
                "Generated node list cache only; rerun to export"
            );
            return Ok(RunStatus::CacheGenerated);
        }

        // Resuming
        self.set_state(ExportState::Resuming);
        let mut journal = CompletionJournal::open(&self.settings.base_path, cache_key)?;
        let completed: HashSet<NodeId> = journal.load()?.into_iter().collect();
        let resume = subtract(&candidates, &completed);

        tracing::info!(
            cache_key = %cache_key,
            previously_exported = completed.len(),
            to_process = resume.len(),
            "Loaded completion journal"
        );
        self.job.set_previously_completed(completed.len());
        self.job.set_remaining_candidates(resume.len());
        report.previously_completed = completed.len();
        report.planned = resume.len();

        // Exporting
        self.set_state(ExportState::Exporting);
        for id in &resume {
            if self.job.is_cancel_requested() {
                tracing::info!(
                    job_id = %self.job.job_id(),
                    exported = self.job.exported(),
                    remaining = self.job.remaining_candidates(),
                    "Export cancelled"
                );
                return Ok(RunStatus::Cancelled);
            }

            self.export_node(id, ctx).await.map_err(|e| {
                tracing::error!(node_id = %id, error = %e, "Node export failed");
                e
            })?;
            journal.append(id)?;
            self.job.node_done();

            let exported = self.job.exported();
            if exported % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    exported = exported,
                    remaining = self.job.remaining_candidates(),
                    "Export progress"
                );
            }
        }

        Ok(RunStatus::Completed)
    }

    async fn export_node(&self, id: &NodeId, ctx: &mut RunContext) -> Result<()> {
        let node = self.repository.node(id).await?;

        if node.is_folder {
            let dir = self.tree.create_folder(&node.path)?;
            return self.write_metadata(&node, &node.path, None, &dir, ctx).await;
        }

        if !self.settings.export_versions {
            return self.export_file(&node, &node.path, None, ctx).await;
        }

        let history = self.repository.version_history(id).await?;
        let resolved = resolve_history(history, id)?;
        for target in export_targets(&resolved, id, self.settings.revision_head) {
            let source = if target.source == node.id {
                node.clone()
            } else {
                self.repository.node(&target.source).await?
            };
            // Revisions are written at the live node's path.
            self.export_file(&source, &node.path, target.suffix.as_deref(), ctx)
                .await?;
        }
        Ok(())
    }

    async fn export_file(
        &self,
        source: &NodeRecord,
        path: &str,
        revision: Option<&str>,
        ctx: &mut RunContext,
    ) -> Result<()> {
        let content_path = self.tree.content_path(path, revision);

        if self.tree.skip_content(&content_path) {
            tracing::debug!(path = %content_path.display(), "Content already exported");
        } else {
            self.tree.ensure_parent(&content_path)?;
            match self
                .repository
                .write_content_to_file(&source.id, &content_path)
                .await
            {
                Ok(ContentStatus::Written) => {}
                Ok(ContentStatus::Absent) => {
                    tracing::debug!(node_id = %source.id, "Node has no content, skipping");
                    return Ok(());
                }
                Err(BulkExportError::Repository(RepositoryError::ContentUnavailable(_))) => {
                    tracing::warn!(
                        node_id = %source.id,
                        path = %content_path.display(),
                        "Content unreadable, writing empty placeholder"
                    );
                    self.tree.write_placeholder(&content_path)?;
                }
                Err(e) => return Err(e),
            }
        }

        self.write_metadata(source, path, revision, &content_path, ctx)
            .await
    }

    async fn write_metadata(
        &self,
        source: &NodeRecord,
        path: &str,
        revision: Option<&str>,
        content_path: &Path,
        ctx: &mut RunContext,
    ) -> Result<()> {
        let metadata_path = self.tree.metadata_path(path, revision);
        if self.tree.skip_metadata(content_path, &metadata_path) {
            tracing::debug!(path = %metadata_path.display(), "Metadata already exported");
            return Ok(());
        }

        let raw = RawMetadata::from(source);
        ctx.policy
            .load_classes(self.repository.as_ref(), self.transformer.classes_of(&raw))
            .await?;
        let document = self.transformer.transform(&raw, &ctx.policy);

        if document.stripped {
            let message = format!(
                "VALIDATE: Stripped invalid XML characters.....{}",
                content_path.display()
            );
            tracing::warn!(node_id = %source.id, "{message}");
            ctx.warnings.push(message);
        }

        self.tree.write_metadata(&metadata_path, &document.text)
    }
}
