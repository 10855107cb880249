//! Alfresco adapter implementation
//!
//! This module provides the REST client for Alfresco Content Services and the
//! API models it exchanges with the server.

pub mod client;
pub mod models;

pub use client::{afts_query, AlfrescoRepository};
pub use models::{NodeEntry, VersionEntry};
