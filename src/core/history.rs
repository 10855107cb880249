//! Version history resolution
//!
//! Turns a node's raw label → revision mapping into an oldest-to-newest list
//! with the newest revision flagged as head, and decides for each revision
//! which node to read and which file suffix to write.

use crate::domain::{BulkExportError, NodeId, Result, Revision, RevisionLabel};
use std::collections::HashMap;

/// Label given to the synthetic head of a node without history
pub const SYNTHETIC_HEAD_LABEL: &str = "1.0";

/// A revision placed in history order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRevision {
    pub revision: Revision,
    pub is_head: bool,
}

/// What to write for one revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    /// Node whose content and metadata are written
    pub source: NodeId,
    /// Version label appended as `.v<label>`, if any
    pub suffix: Option<String>,
    pub is_head: bool,
}

/// Sorts labels by numeric component order
pub fn order_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut parsed: Vec<RevisionLabel> = labels.into_iter().map(RevisionLabel::parse).collect();
    // Stable, so equal-comparing labels such as "1" and "1.0" keep input order.
    parsed.sort();
    parsed.into_iter().map(|l| l.as_str().to_string()).collect()
}

/// Orders a node's history and flags its head
///
/// `None` (node not versioned) resolves to one synthetic `1.0` head backed by
/// the node itself. `Some` with no entries is an error for that node.
pub fn resolve_history(
    history: Option<HashMap<String, Revision>>,
    node: &NodeId,
) -> Result<Vec<ResolvedRevision>> {
    let Some(mut history) = history else {
        tracing::debug!(node_id = %node, "No version history, exporting node as head revision");
        return Ok(vec![ResolvedRevision {
            revision: Revision::new(SYNTHETIC_HEAD_LABEL, "", node.clone()),
            is_head: true,
        }]);
    };

    if history.is_empty() {
        return Err(BulkExportError::NoRevisions(node.to_string()));
    }

    let mut labels: Vec<String> = history.keys().cloned().collect();
    // HashMap order is arbitrary; fix it before the stable numeric sort.
    labels.sort();
    let ordered = order_labels(labels.iter().map(String::as_str));
    let last = ordered.len() - 1;

    Ok(ordered
        .into_iter()
        .enumerate()
        .filter_map(|(i, label)| {
            history.remove(&label).map(|revision| ResolvedRevision {
                revision,
                is_head: i == last,
            })
        })
        .collect())
}

/// Decides source node and suffix for each resolved revision
///
/// Non-head revisions always read their frozen snapshot and carry a suffix.
/// The head always reads the live node `live`, so aspects and properties
/// added after the last version are exported; it carries a suffix only when
/// `numbered_head` is set.
pub fn export_targets(
    resolved: &[ResolvedRevision],
    live: &NodeId,
    numbered_head: bool,
) -> Vec<ExportTarget> {
    resolved
        .iter()
        .map(|r| {
            if r.is_head {
                ExportTarget {
                    source: live.clone(),
                    suffix: numbered_head.then(|| r.revision.label.clone()),
                    is_head: true,
                }
            } else {
                ExportTarget {
                    source: r.revision.content_node.clone(),
                    suffix: Some(r.revision.label.clone()),
                    is_head: false,
                }
            }
        })
        .collect()
}
