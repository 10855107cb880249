//! Core export engine.
//!
//! # Modules
//!
//! - [`traversal`] - Candidate selection by recursive descent or date query
//! - [`state`] - Node-list cache and completion journal
//! - [`history`] - Version history ordering and head selection
//! - [`transform`] - Metadata document pipeline
//! - [`export`] - Job counters, driver state machine, output tree, report
//!
//! # Export Workflow
//!
//! 1. **Plan**: load the node-list cache for the scope's cache key, or
//!    compute and persist it
//! 2. **Resume**: subtract nodes already in the completion journal
//! 3. **Export**: write content and metadata per node (all revisions when
//!    requested), journaling each node when done
//! 4. **Report**: summarize counts, warnings and terminal status
//!
//! # Example
//!
//! ```rust,no_run
//! use bulk_export::adapters::InMemoryRepository;
//! use bulk_export::core::export::{ExportDriver, ExportJob, ExportSettings};
//! use bulk_export::domain::{JobScope, NodeId};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = Arc::new(InMemoryRepository::new());
//! let scope = JobScope::Descent { root: NodeId::new("root")? };
//! let job = Arc::new(ExportJob::new(ExportJob::id_for_scope(&scope)));
//!
//! let driver = ExportDriver::new(repository, ExportSettings::new("/tmp/export"), job);
//! let report = driver.run(&scope).await;
//!
//! println!("Status: {}", report.status);
//! println!("Exported: {}", report.exported);
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod history;
pub mod state;
pub mod transform;
pub mod traversal;
