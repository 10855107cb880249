//! In-memory content repository
//!
//! A complete `ContentRepository` held in process memory. Used for engine
//! tests and for dry runs against a synthetic tree. It can inject failures,
//! mark content as unreadable and fire a hook after a given number of content
//! reads, which tests use to request cancellation mid-run.

use super::repository::{ContentRepository, ModifiedQuery};
use crate::domain::{
    BulkExportError, NodeId, PropertyDefinition, PropertyValue, RepositoryError, Result, Revision,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

type ReadHook = Arc<dyn Fn() + Send + Sync>;

/// Description of a node to insert
///
/// # Example
///
/// ```
/// use bulk_export::adapters::memory::{InMemoryRepository, NodeSpec};
///
/// let repo = InMemoryRepository::new();
/// repo.insert(NodeSpec::folder("root", "Company Home")).unwrap();
/// repo.insert(NodeSpec::file("doc", "report.txt").parent("root").content(b"hello"))
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct NodeSpec {
    id: String,
    name: String,
    parent: Option<String>,
    is_folder: bool,
    node_type: String,
    aspects: Vec<String>,
    properties: BTreeMap<String, PropertyValue>,
    content: Option<Vec<u8>>,
    unreadable: bool,
    modified: DateTime<Utc>,
}

impl NodeSpec {
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::base(id.into(), name.into(), true, "cm:folder")
    }

    /// A file node with empty content
    pub fn file(id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut spec = Self::base(id.into(), name.into(), false, "cm:content");
        spec.content = Some(Vec::new());
        spec
    }

    fn base(id: String, name: String, is_folder: bool, node_type: &str) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert("cm:name".to_string(), PropertyValue::Text(name.clone()));
        Self {
            id,
            name,
            parent: None,
            is_folder,
            node_type: node_type.to_string(),
            aspects: Vec::new(),
            properties,
            content: None,
            unreadable: false,
            modified: Utc::now(),
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = node_type.into();
        self
    }

    pub fn aspect(mut self, aspect: impl Into<String>) -> Self {
        self.aspects.push(aspect.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn content(mut self, bytes: &[u8]) -> Self {
        self.content = Some(bytes.to_vec());
        self
    }

    /// The node reports no content at all
    pub fn no_content(mut self) -> Self {
        self.content = None;
        self
    }

    /// Content exists but every read fails
    pub fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }

    pub fn modified(mut self, at: DateTime<Utc>) -> Self {
        self.modified = at;
        self
    }
}

#[derive(Debug, Clone)]
struct Entry {
    spec: NodeSpec,
    children: Vec<NodeId>,
    history: Option<HashMap<String, Revision>>,
    /// Frozen revision snapshot, not part of the tree
    snapshot_of: Option<NodeId>,
}

#[derive(Default)]
struct State {
    nodes: HashMap<NodeId, Entry>,
    order: Vec<NodeId>,
    classes: HashMap<String, Vec<PropertyDefinition>>,
    failing: HashSet<NodeId>,
    content_reads: usize,
    read_hook: Option<(usize, ReadHook)>,
    definition_lookups: usize,
    query_pages: usize,
}

impl State {
    fn entry(&self, id: &NodeId) -> Result<&Entry> {
        self.nodes
            .get(id)
            .ok_or_else(|| RepositoryError::NodeNotFound(id.to_string()).into())
    }

    fn check_failing(&self, id: &NodeId) -> Result<()> {
        if self.failing.contains(id) {
            return Err(RepositoryError::ServerError {
                status: 500,
                message: format!("injected failure for {id}"),
            }
            .into());
        }
        Ok(())
    }

    fn path_of(&self, id: &NodeId) -> Result<String> {
        let entry = self.entry(id)?;
        if let Some(live) = &entry.snapshot_of {
            return self.path_of(live);
        }
        let mut names = vec![entry.spec.name.clone()];
        let mut parent = entry.spec.parent.clone();
        while let Some(p) = parent {
            let pid = NodeId::new(p).map_err(BulkExportError::Validation)?;
            let pentry = self.entry(&pid)?;
            names.push(pentry.spec.name.clone());
            parent = pentry.spec.parent.clone();
        }
        names.reverse();
        Ok(format!("/{}", names.join("/")))
    }

    fn is_below(&self, id: &NodeId, root: &NodeId) -> bool {
        let mut parent = self.nodes.get(id).and_then(|e| e.spec.parent.clone());
        while let Some(p) = parent {
            if p == root.as_str() {
                return true;
            }
            parent = NodeId::new(p)
                .ok()
                .and_then(|pid| self.nodes.get(&pid))
                .and_then(|e| e.spec.parent.clone());
        }
        false
    }
}

/// Content repository held entirely in memory
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a node, appending it to its parent's children
    pub fn insert(&self, spec: NodeSpec) -> Result<NodeId> {
        let id = NodeId::new(spec.id.clone()).map_err(BulkExportError::Validation)?;
        let mut state = self.lock();
        if state.nodes.contains_key(&id) {
            return Err(BulkExportError::Validation(format!("Duplicate node {id}")));
        }
        if let Some(parent) = &spec.parent {
            let pid = NodeId::new(parent.clone()).map_err(BulkExportError::Validation)?;
            let pentry = state
                .nodes
                .get_mut(&pid)
                .ok_or_else(|| BulkExportError::Validation(format!("Unknown parent {pid}")))?;
            pentry.children.push(id.clone());
        }
        state.order.push(id.clone());
        state.nodes.insert(
            id.clone(),
            Entry {
                spec,
                children: Vec::new(),
                history: None,
                snapshot_of: None,
            },
        );
        Ok(id)
    }

    /// Adds a revision to a node's history
    ///
    /// The revision is backed by a frozen snapshot of the node's current
    /// metadata holding `content`.
    pub fn add_revision(
        &self,
        node: &NodeId,
        label: &str,
        comment: &str,
        content: Option<&[u8]>,
    ) -> Result<()> {
        let mut state = self.lock();
        let live = state.entry(node)?.spec.clone();
        let snapshot_id =
            NodeId::new(format!("{node};{label}")).map_err(BulkExportError::Validation)?;

        let mut spec = live;
        spec.id = snapshot_id.to_string();
        spec.parent = None;
        spec.content = content.map(<[u8]>::to_vec);
        spec.unreadable = false;
        spec.properties.insert(
            "cm:versionLabel".to_string(),
            PropertyValue::Text(label.to_string()),
        );

        state.nodes.insert(
            snapshot_id.clone(),
            Entry {
                spec,
                children: Vec::new(),
                history: None,
                snapshot_of: Some(node.clone()),
            },
        );

        let entry = state
            .nodes
            .get_mut(node)
            .ok_or_else(|| RepositoryError::NodeNotFound(node.to_string()))?;
        entry
            .history
            .get_or_insert_with(HashMap::new)
            .insert(label.to_string(), Revision::new(label, comment, snapshot_id));
        Ok(())
    }

    /// Marks a node as versioned but with no revisions
    pub fn set_empty_history(&self, node: &NodeId) -> Result<()> {
        let mut state = self.lock();
        let entry = state
            .nodes
            .get_mut(node)
            .ok_or_else(|| RepositoryError::NodeNotFound(node.to_string()))?;
        entry.history = Some(HashMap::new());
        Ok(())
    }

    /// Registers the property definitions of a type or aspect
    pub fn define_class(&self, class_name: &str, definitions: Vec<PropertyDefinition>) {
        self.lock()
            .classes
            .insert(class_name.to_string(), definitions);
    }

    /// Every metadata or content request for `node` fails from now on
    pub fn fail_on(&self, node: &NodeId) {
        self.lock().failing.insert(node.clone());
    }

    /// Calls `hook` once, right after the `after`-th content read
    pub fn on_content_read(&self, after: usize, hook: impl Fn() + Send + Sync + 'static) {
        self.lock().read_hook = Some((after, Arc::new(hook)));
    }

    pub fn content_reads(&self) -> usize {
        self.lock().content_reads
    }

    pub fn definition_lookups(&self) -> usize {
        self.lock().definition_lookups
    }

    pub fn query_pages(&self) -> usize {
        self.lock().query_pages
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn children(&self, id: &NodeId) -> Result<Vec<NodeId>> {
        let state = self.lock();
        state.check_failing(id)?;
        Ok(state.entry(id)?.children.clone())
    }

    async fn is_folder(&self, id: &NodeId) -> Result<bool> {
        Ok(self.lock().entry(id)?.spec.is_folder)
    }

    async fn node_type(&self, id: &NodeId) -> Result<String> {
        Ok(self.lock().entry(id)?.spec.node_type.clone())
    }

    async fn aspects(&self, id: &NodeId) -> Result<Vec<String>> {
        Ok(self.lock().entry(id)?.spec.aspects.clone())
    }

    async fn properties(&self, id: &NodeId) -> Result<BTreeMap<String, PropertyValue>> {
        let state = self.lock();
        state.check_failing(id)?;
        Ok(state.entry(id)?.spec.properties.clone())
    }

    async fn path(&self, id: &NodeId) -> Result<String> {
        self.lock().path_of(id)
    }

    async fn version_history(&self, id: &NodeId) -> Result<Option<HashMap<String, Revision>>> {
        let state = self.lock();
        state.check_failing(id)?;
        Ok(state.entry(id)?.history.clone())
    }

    async fn query_page(
        &self,
        query: &ModifiedQuery,
        skip: usize,
        max: usize,
    ) -> Result<Vec<NodeId>> {
        let mut state = self.lock();
        state.query_pages += 1;
        let from = query.range.from_instant();
        let to = query.range.to_instant();

        let page = state
            .order
            .iter()
            .filter(|id| state.is_below(id, &query.root))
            .filter(|id| {
                state.nodes.get(*id).is_some_and(|e| {
                    let modified = e.spec.modified;
                    from.map_or(true, |f| modified >= f) && to.map_or(true, |t| modified <= t)
                })
            })
            .skip(skip)
            .take(max)
            .cloned()
            .collect();
        Ok(page)
    }

    async fn read_content(&self, id: &NodeId) -> Result<Option<Vec<u8>>> {
        let (result, hook) = {
            let mut state = self.lock();
            state.check_failing(id)?;
            let entry = state.entry(id)?;
            let result: Result<Option<Vec<u8>>> = if entry.spec.unreadable {
                Err(RepositoryError::ContentUnavailable(id.to_string()).into())
            } else {
                Ok(entry.spec.content.clone())
            };

            state.content_reads += 1;
            let reads = state.content_reads;
            let hook = match &state.read_hook {
                Some((after, hook)) if *after == reads => Some(Arc::clone(hook)),
                _ => None,
            };
            (result, hook)
        };

        if let Some(hook) = hook {
            hook();
        }
        result
    }

    async fn property_definitions(
        &self,
        class_name: &str,
    ) -> Result<Option<Vec<PropertyDefinition>>> {
        let mut state = self.lock();
        state.definition_lookups += 1;
        Ok(state.classes.get(class_name).cloned())
    }
}
