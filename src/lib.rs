// Bulk Export - Versioned content repository to file system exporter
// Copyright (c) 2025 Bulk Export Contributors
// Licensed under the MIT License

//! # Bulk Export
//!
//! Mirrors a subtree of a versioned content repository onto the local file
//! system: folders become directories, content becomes files, and each node's
//! type, aspects and properties are written to a sidecar metadata document.
//!
//! ## Overview
//!
//! This library provides:
//! - **Selecting** nodes by recursive descent from a root, or by one flat
//!   modification-date query below it
//! - **Resuming** interrupted jobs from a persisted node-list cache and an
//!   append-only completion journal
//! - **Exporting** either the head revision or every revision of a node
//! - **Rewriting** metadata with custom aspects, properties, renames and
//!   namespace prefix rewrites
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export engine (traversal, state, history, transform, export)
//! - [`adapters`] - Repository capability and its transports
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bulk_export::adapters::AlfrescoRepository;
//! use bulk_export::config::load_config;
//! use bulk_export::core::export::{ExportDriver, ExportJob};
//! use bulk_export::domain::JobScope;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("bulk-export.toml")?;
//!     let repository = Arc::new(AlfrescoRepository::new(config.repository.clone())?);
//!
//!     let scope = JobScope::Descent { root: config.export.root()? };
//!     let job = Arc::new(ExportJob::new(ExportJob::id_for_scope(&scope)));
//!     let driver = ExportDriver::new(repository, config.to_settings(), job);
//!
//!     let report = driver.run(&scope).await;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```
//!
//! ## Resuming
//!
//! The candidate list of a scope is stored under its cache key in the export
//! directory. Every node is journaled once its files are written, so running
//! the same job again skips straight to the first unfinished node:
//!
//! ```rust,no_run
//! use bulk_export::core::state::{CompletionJournal, NodeListCache};
//! use bulk_export::domain::{CacheKey, JobScope, NodeId};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let scope = JobScope::Descent { root: NodeId::new("root")? };
//! let key = CacheKey::for_scope(&scope);
//! let dir = Path::new("./export");
//!
//! let cached = NodeListCache::new(dir).get(&key)?.unwrap_or_default();
//! let remaining = CompletionJournal::inspect(dir, &key).resume_set(&cached)?;
//! println!("{} of {} nodes left", remaining.len(), cached.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Fallible library calls return [`domain::Result`], whose error type is
//! [`domain::BulkExportError`]. [`core::export::ExportDriver::run`] never
//! fails outright: errors end up in the returned report.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
