//! Domain models and types for the exporter.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`NodeId`], [`CacheKey`])
//! - **Repository models** ([`NodeRecord`], [`PropertyValue`], [`Revision`])
//! - **Job scope** ([`JobScope`], [`DateRange`])
//! - **Error types** ([`BulkExportError`], [`RepositoryError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Node ids and cache keys are distinct newtypes, so a cache key can never be
//! passed where a node is expected:
//!
//! ```rust
//! use bulk_export::domain::{CacheKey, JobScope, NodeId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let root = NodeId::new("8f2c0d1e-1111-2222-3333-444455556666")?;
//! let key = CacheKey::for_scope(&JobScope::Descent { root: root.clone() });
//! assert_eq!(key.as_str(), root.as_str());
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod node;
pub mod result;
pub mod revision;
pub mod scope;

// Re-export commonly used types for convenience
pub use errors::{BulkExportError, RepositoryError};
pub use ids::{CacheKey, NodeId};
pub use node::{DataType, NodeRecord, PropertyDefinition, PropertyValue};
pub use result::Result;
pub use revision::{Revision, RevisionLabel};
pub use scope::{parse_date_bound, DateRange, JobScope};
