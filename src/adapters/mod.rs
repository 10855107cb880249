//! Content repository integrations.
//!
//! - [`repository`] - The `ContentRepository` trait the export engine uses
//! - [`alfresco`] - Alfresco Content Services over the public REST API
//! - [`memory`] - In-memory repository used by tests
//!
//! # Design Pattern
//!
//! Adapters isolate the transport behind one trait so the engine can be
//! driven by the REST client in production and by the in-memory repository
//! in tests.
//!
//! ```rust,no_run
//! use bulk_export::adapters::{AlfrescoRepository, ContentRepository};
//! use bulk_export::config::{secret_string, RepositoryConfig};
//! use bulk_export::domain::NodeId;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RepositoryConfig {
//!     base_url: "http://localhost:8080".to_string(),
//!     username: Some("admin".to_string()),
//!     password: Some(secret_string("admin".to_string())),
//!     ..Default::default()
//! };
//!
//! let repository: Arc<dyn ContentRepository> = Arc::new(AlfrescoRepository::new(config)?);
//! let root = repository.node(&NodeId::new("-root-")?).await?;
//! println!("{}", root.path);
//! # Ok(())
//! # }
//! ```

pub mod alfresco;
pub mod memory;
pub mod repository;

pub use alfresco::AlfrescoRepository;
pub use memory::{InMemoryRepository, NodeSpec};
pub use repository::{ContentRepository, ContentStatus, ModifiedQuery, NodeSummary};
