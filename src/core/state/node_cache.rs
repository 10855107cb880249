//! Node-list cache
//!
//! Persists the candidate node list of a job scope so that a restarted run
//! does not enumerate the repository again. One file per cache key,
//! `<dir>/<key>.cache`, written once and never updated.

use super::record::{decode_records, encode_record, CACHE_MAGIC};
use crate::domain::{BulkExportError, CacheKey, NodeId, Result};
use std::fs;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Candidate list returned by [`NodeListCache::operate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedList {
    pub nodes: Vec<NodeId>,
    /// True when the list was computed and persisted by this call
    pub generated: bool,
}

/// File-backed node-list cache
#[derive(Debug, Clone)]
pub struct NodeListCache {
    dir: PathBuf,
}

impl NodeListCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Location of the cache file for `key`
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.cache", key.file_stem()))
    }

    /// Loads the persisted list for `key`
    ///
    /// Returns `Ok(None)` when no cache file exists (or it is empty) and an
    /// error when the file cannot be read or is corrupt.
    pub fn get(&self, key: &CacheKey) -> Result<Option<Vec<NodeId>>> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BulkExportError::State(format!(
                    "Failed to read node cache {}: {e}",
                    path.display()
                )))
            }
        };
        if bytes.is_empty() {
            return Ok(None);
        }

        let decoded = decode_records(&bytes, CACHE_MAGIC)?;
        if !decoded.clean {
            return Err(BulkExportError::State(format!(
                "Node cache {} is corrupt after {} entries; delete it to re-plan",
                path.display(),
                decoded.ids.len()
            )));
        }
        Ok(Some(decoded.ids))
    }

    /// Persists `nodes` under `key`
    ///
    /// Fails when a non-empty cache already exists for the key. The list is
    /// written to a temporary sibling and renamed into place.
    pub fn put(&self, key: &CacheKey, nodes: &[NodeId]) -> Result<()> {
        let path = self.path_for(key);
        if fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false) {
            return Err(BulkExportError::State(format!(
                "Node cache {} already exists",
                path.display()
            )));
        }

        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("cache.tmp");

        let mut buf = CACHE_MAGIC.to_vec();
        for id in nodes {
            buf.extend(encode_record(id)?);
        }

        write_synced(&tmp, &buf).map_err(|e| {
            BulkExportError::State(format!("Failed to write node cache {}: {e}", tmp.display()))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            BulkExportError::State(format!(
                "Failed to move node cache into place at {}: {e}",
                path.display()
            ))
        })?;

        tracing::debug!(cache_key = %key, count = nodes.len(), path = %path.display(), "Node cache written");
        Ok(())
    }

    /// Returns the cached list for `key`, computing and persisting it when
    /// absent
    ///
    /// `plan` yields `None` when planning was cancelled; nothing is persisted
    /// then and `operate` returns `None` too.
    pub async fn operate<F, Fut>(&self, key: &CacheKey, plan: F) -> Result<Option<CachedList>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Vec<NodeId>>>>,
    {
        if let Some(nodes) = self.get(key)? {
            tracing::info!(cache_key = %key, count = nodes.len(), "Using cached node list");
            return Ok(Some(CachedList {
                nodes,
                generated: false,
            }));
        }

        let Some(nodes) = plan().await? else {
            return Ok(None);
        };
        self.put(key, &nodes)?;
        tracing::info!(cache_key = %key, count = nodes.len(), "Node list cached");

        Ok(Some(CachedList {
            nodes,
            generated: true,
        }))
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
