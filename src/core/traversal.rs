//! Candidate selection
//!
//! Produces the ordered list of nodes a job will export, either by recursive
//! descent from a root or by a flat date-filtered query. Both strategies honor
//! the job's cancellation flag and log progress every
//! [`PROGRESS_INTERVAL`] nodes.

use crate::adapters::repository::{ContentRepository, ModifiedQuery};
use crate::core::export::ExportJob;
use crate::domain::{DateRange, JobScope, NodeId, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// Page size of flat queries
pub const PAGE_SIZE: usize = 500;

/// Nodes between two progress log lines
pub const PROGRESS_INTERVAL: usize = 100;

/// Fixed lists of repository classes and properties that are never exported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRules {
    pub types: HashSet<String>,
    pub properties: HashSet<String>,
    pub property_namespaces: HashSet<String>,
    pub aspects: HashSet<String>,
    pub aspect_namespaces: HashSet<String>,
}

fn set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn namespace(name: &str) -> Option<&str> {
    name.split_once(':').map(|(ns, _)| ns)
}

impl IgnoreRules {
    /// Rules for a stock repository
    pub fn standard() -> Self {
        Self {
            types: set(&[
                "cm:systemfolder",
                "app:filelink",
                "app:folderlink",
                "cm:rating",
                "act:action",
                "act:compositeaction",
            ]),
            properties: set(&[
                "sys:node-dbid",
                "cm:categories",
                "cm:versionLabel",
                "cm:versionType",
                "cm:lastThumbnailModification",
            ]),
            property_namespaces: set(&["app", "exif"]),
            aspects: set(&["cm:thumbnailModification"]),
            aspect_namespaces: set(&["app"]),
        }
    }

    /// Rules that ignore nothing
    pub fn none() -> Self {
        Self {
            types: HashSet::new(),
            properties: HashSet::new(),
            property_namespaces: HashSet::new(),
            aspects: HashSet::new(),
            aspect_namespaces: HashSet::new(),
        }
    }

    pub fn is_type_ignored(&self, node_type: &str) -> bool {
        self.types.contains(node_type)
    }

    pub fn is_property_ignored(&self, name: &str) -> bool {
        self.properties.contains(name)
            || namespace(name).is_some_and(|ns| self.property_namespaces.contains(ns))
    }

    pub fn is_aspect_ignored(&self, name: &str) -> bool {
        self.aspects.contains(name)
            || namespace(name).is_some_and(|ns| self.aspect_namespaces.contains(ns))
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::standard()
    }
}

/// How a scope selects its candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionStrategy {
    Descent,
    FlatQuery(DateRange),
}

impl SelectionStrategy {
    pub fn for_scope(scope: &JobScope) -> Self {
        match scope {
            JobScope::Descent { .. } => SelectionStrategy::Descent,
            JobScope::Modified { range, .. } => SelectionStrategy::FlatQuery(range.clone()),
        }
    }
}

/// Candidate list produced by one planning pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Planned {
    pub nodes: Vec<NodeId>,
    /// Planning stopped early; `nodes` is partial
    pub cancelled: bool,
}

/// Computes candidate lists
pub struct TraversalPlanner {
    repository: Arc<dyn ContentRepository>,
    rules: IgnoreRules,
    page_size: usize,
}

impl TraversalPlanner {
    pub fn new(repository: Arc<dyn ContentRepository>, rules: IgnoreRules) -> Self {
        Self {
            repository,
            rules,
            page_size: PAGE_SIZE,
        }
    }

    /// Overrides the query page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Plans the candidates of `scope`
    ///
    /// Every node found is added to the job's total-candidates counter.
    pub async fn plan(&self, scope: &JobScope, job: &ExportJob) -> Result<Planned> {
        match (SelectionStrategy::for_scope(scope), scope) {
            (SelectionStrategy::FlatQuery(range), JobScope::Modified { root, path, .. }) => {
                let query = ModifiedQuery {
                    root: root.clone(),
                    path: path.clone(),
                    range,
                };
                self.flat_query(&query, job).await
            }
            _ => self.descend(scope.root(), job).await,
        }
    }

    async fn descend(&self, root: &NodeId, job: &ExportJob) -> Result<Planned> {
        tracing::info!(root = %root, "Planning by recursive descent");

        let mut nodes = Vec::new();
        let mut stack = vec![root.clone()];

        while let Some(id) = stack.pop() {
            if job.is_cancel_requested() {
                tracing::info!(found = nodes.len(), "Planning cancelled");
                return Ok(Planned {
                    nodes,
                    cancelled: true,
                });
            }

            let summary = self.repository.summary(&id).await?;
            if self.rules.is_type_ignored(&summary.node_type) {
                tracing::debug!(
                    node_id = %id,
                    node_type = %summary.node_type,
                    "Skipping ignored type"
                );
                continue;
            }

            nodes.push(id.clone());
            self.found(job, nodes.len());

            if summary.is_folder {
                let children = self.repository.children(&id).await?;
                // Reversed so the first child is popped first.
                stack.extend(children.into_iter().rev());
            }
        }

        tracing::info!(root = %root, found = nodes.len(), "Recursive descent complete");
        Ok(Planned {
            nodes,
            cancelled: false,
        })
    }

    async fn flat_query(&self, query: &ModifiedQuery, job: &ExportJob) -> Result<Planned> {
        tracing::info!(
            root = %query.root,
            path = %query.path,
            range = %query.range,
            page_size = self.page_size,
            "Planning by modification-date query"
        );

        let mut raw = Vec::new();
        let mut skip = 0;
        loop {
            if job.is_cancel_requested() {
                tracing::info!(found = raw.len(), "Planning cancelled");
                return Ok(Planned {
                    nodes: raw,
                    cancelled: true,
                });
            }

            let page = self
                .repository
                .query_page(query, skip, self.page_size)
                .await?;
            if page.is_empty() {
                break;
            }
            skip += page.len();
            tracing::debug!(page_len = page.len(), fetched = skip, "Query page received");
            raw.extend(page);
        }

        let mut nodes = Vec::with_capacity(raw.len());
        for id in raw {
            if job.is_cancel_requested() {
                tracing::info!(found = nodes.len(), "Planning cancelled");
                return Ok(Planned {
                    nodes,
                    cancelled: true,
                });
            }
            let node_type = self.repository.summary(&id).await?.node_type;
            if self.rules.is_type_ignored(&node_type) {
                tracing::debug!(node_id = %id, node_type = %node_type, "Skipping ignored type");
                continue;
            }
            nodes.push(id);
            self.found(job, nodes.len());
        }

        tracing::info!(found = nodes.len(), "Modification-date query complete");
        Ok(Planned {
            nodes,
            cancelled: false,
        })
    }

    fn found(&self, job: &ExportJob, count: usize) {
        job.add_total_candidates(1);
        if count % PROGRESS_INTERVAL == 0 {
            tracing::info!(count = count, "Planning progress");
        }
    }
}
