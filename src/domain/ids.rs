//! Domain identifier types with validation
//!
//! Newtype wrappers for repository node identifiers and for the cache key that
//! names a job's persisted state files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::scope::JobScope;

/// Repository node identifier newtype wrapper
///
/// Opaque identifier of one content item or folder. Unique within a
/// repository, stable across runs and never reused.
///
/// # Examples
///
/// ```
/// use bulk_export::domain::ids::NodeId;
/// use std::str::FromStr;
///
/// let id = NodeId::from_str("7d44b88c-4199-4bad-97dc-d78268e01398").unwrap();
/// assert_eq!(id.as_str(), "7d44b88c-4199-4bad-97dc-d78268e01398");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a new NodeId from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(NodeId)` if the ID is non-blank, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Node ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the node ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Cache key newtype wrapper
///
/// Identifies a job's selection scope. Derived deterministically from the
/// [`JobScope`] and used to name the node-list cache and the completion
/// journal.
///
/// # Examples
///
/// ```
/// use bulk_export::domain::{CacheKey, DateRange, JobScope, NodeId};
///
/// let scope = JobScope::Modified {
///     root: NodeId::new("root").unwrap(),
///     path: "/Company Home".to_string(),
///     range: DateRange::new(Some("2024-01-01".to_string()), None).unwrap(),
/// };
/// assert_eq!(CacheKey::for_scope(&scope).as_str(), "FROM-2024-01-01");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Creates a cache key from an arbitrary non-blank string
    pub fn new(key: impl Into<String>) -> Result<Self, String> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err("Cache key cannot be empty".to_string());
        }
        Ok(Self(key))
    }

    /// Derives the cache key of a job scope
    ///
    /// Descent scopes use the root node id. Date-filtered scopes use
    /// `FROM-<from>`, `TO-<to>` or `FROM-<from>_TO-<to>`.
    pub fn for_scope(scope: &JobScope) -> Self {
        match scope {
            JobScope::Descent { root } => Self(root.as_str().to_string()),
            JobScope::Modified { range, .. } => match (&range.from, &range.to) {
                (Some(from), None) => Self(format!("FROM-{from}")),
                (None, Some(to)) => Self(format!("TO-{to}")),
                (Some(from), Some(to)) => Self(format!("FROM-{from}_TO-{to}")),
                // DateRange::new rejects an empty range
                (None, None) => Self("FROM-".to_string()),
            },
        }
    }

    /// Returns the cache key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-system safe form of the key
    ///
    /// Every character outside `[A-Za-z0-9._-]` becomes `_`.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scope::DateRange;

    fn root() -> NodeId {
        NodeId::new("root-1").unwrap()
    }

    fn modified(from: Option<&str>, to: Option<&str>) -> JobScope {
        JobScope::Modified {
            root: root(),
            path: "/Company Home".to_string(),
            range: DateRange::new(from.map(String::from), to.map(String::from)).unwrap(),
        }
    }

    #[test]
    fn test_node_id_valid() {
        let id = NodeId::new("abc-123").unwrap();
        assert_eq!(id.as_str(), "abc-123");
        assert_eq!(id.to_string(), "abc-123");
    }

    #[test]
    fn test_node_id_empty() {
        assert!(NodeId::new("").is_err());
        assert!(NodeId::new("   ").is_err());
    }

    #[test]
    fn test_node_id_from_str() {
        let id: NodeId = "n-1".parse().unwrap();
        assert_eq!(id.into_inner(), "n-1");
    }

    #[test]
    fn test_node_id_serde() {
        let id = NodeId::new("n-1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"n-1\"");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_cache_key_for_descent() {
        let key = CacheKey::for_scope(&JobScope::Descent { root: root() });
        assert_eq!(key.as_str(), "root-1");
    }

    #[test]
    fn test_cache_key_for_date_ranges() {
        assert_eq!(
            CacheKey::for_scope(&modified(Some("2024-01-01"), None)).as_str(),
            "FROM-2024-01-01"
        );
        assert_eq!(
            CacheKey::for_scope(&modified(None, Some("2024-02-01"))).as_str(),
            "TO-2024-02-01"
        );
        assert_eq!(
            CacheKey::for_scope(&modified(Some("2024-01-01"), Some("2024-02-01"))).as_str(),
            "FROM-2024-01-01_TO-2024-02-01"
        );
    }

    #[test]
    fn test_cache_key_file_stem_sanitizes() {
        let key = CacheKey::new("FROM-2024-01-01T10:00:00+02:00").unwrap();
        assert_eq!(key.file_stem(), "FROM-2024-01-01T10_00_00_02_00");

        let key = CacheKey::new("workspace://SpacesStore/abc").unwrap();
        assert_eq!(key.file_stem(), "workspace___SpacesStore_abc");
    }

    #[test]
    fn test_cache_key_empty() {
        assert!(CacheKey::new(" ").is_err());
    }
}
