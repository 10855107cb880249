//! Content repository capability
//!
//! This module defines the `ContentRepository` trait: everything the export
//! engine needs from the repository, independent of transport. The engine only
//! ever talks to an `Arc<dyn ContentRepository>`.

use crate::domain::{
    BulkExportError, DateRange, NodeId, NodeRecord, PropertyDefinition, PropertyValue, Result,
    Revision,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Flat, path-scoped modification-date query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifiedQuery {
    /// Root node of the subtree being searched
    pub root: NodeId,
    /// Display path of the root, used by transports that scope by path
    pub path: String,
    pub range: DateRange,
}

/// Type and folder flag of a node, all the planner needs to know
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    pub node_type: String,
    pub is_folder: bool,
}

/// Outcome of writing a node's content to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStatus {
    /// Content was written (possibly zero-length)
    Written,
    /// The node has no content at all; nothing was written
    Absent,
}

/// Trait for content repository implementations
///
/// # Example
///
/// ```no_run
/// use bulk_export::adapters::{ContentRepository, InMemoryRepository};
/// use bulk_export::domain::NodeId;
///
/// # async fn example() -> bulk_export::domain::Result<()> {
/// let repo = InMemoryRepository::new();
/// let root = NodeId::new("root").expect("valid node id");
/// let record = repo.node(&root).await?;
/// println!("{} is a {}", record.path, record.node_type);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Direct children of a node, in repository order
    async fn children(&self, id: &NodeId) -> Result<Vec<NodeId>>;

    async fn is_folder(&self, id: &NodeId) -> Result<bool>;

    /// Qualified type name, e.g. `cm:content`
    async fn node_type(&self, id: &NodeId) -> Result<String>;

    async fn aspects(&self, id: &NodeId) -> Result<Vec<String>>;

    async fn properties(&self, id: &NodeId) -> Result<BTreeMap<String, PropertyValue>>;

    /// Display path including the node's own name
    async fn path(&self, id: &NodeId) -> Result<String>;

    /// Type and folder flag together
    ///
    /// Transports that fetch both in one round trip should override this.
    async fn summary(&self, id: &NodeId) -> Result<NodeSummary> {
        Ok(NodeSummary {
            node_type: self.node_type(id).await?,
            is_folder: self.is_folder(id).await?,
        })
    }

    /// Complete snapshot of a node
    ///
    /// Transports that can fetch everything in one round trip should override
    /// this.
    async fn node(&self, id: &NodeId) -> Result<NodeRecord> {
        Ok(NodeRecord {
            id: id.clone(),
            is_folder: self.is_folder(id).await?,
            node_type: self.node_type(id).await?,
            aspects: self.aspects(id).await?,
            properties: self.properties(id).await?,
            path: self.path(id).await?,
        })
    }

    /// Version history keyed by label
    ///
    /// `None` means the node is not versioned at all.
    async fn version_history(&self, id: &NodeId) -> Result<Option<HashMap<String, Revision>>>;

    /// One page of a flat modification-date query
    async fn query_page(&self, query: &ModifiedQuery, skip: usize, max: usize)
        -> Result<Vec<NodeId>>;

    /// Content bytes of a node
    ///
    /// `Ok(None)` means the node has no content.
    /// `Err(RepositoryError::ContentUnavailable)` means content exists but
    /// cannot be read.
    async fn read_content(&self, id: &NodeId) -> Result<Option<Vec<u8>>>;

    /// Writes a node's content to `dest`
    async fn write_content_to_file(&self, id: &NodeId, dest: &Path) -> Result<ContentStatus> {
        match self.read_content(id).await? {
            Some(bytes) => {
                tokio::fs::write(dest, bytes).await.map_err(|e| {
                    BulkExportError::Io(format!("Failed to write {}: {e}", dest.display()))
                })?;
                Ok(ContentStatus::Written)
            }
            None => Ok(ContentStatus::Absent),
        }
    }

    /// Properties declared by a type or aspect
    ///
    /// `None` when the dictionary does not know the class.
    async fn property_definitions(&self, class_name: &str)
        -> Result<Option<Vec<PropertyDefinition>>>;
}
