//! Export orchestration
//!
//! This module provides the export engine proper:
//! - Job counters and cooperative cancellation
//! - The driver state machine
//! - Output tree layout
//! - Run reporting

pub mod driver;
pub mod job;
pub mod report;
pub mod writer;

pub use driver::{ExportDriver, ExportSettings, ExportState};
pub use job::{ExportJob, JobProgress};
pub use report::{ExportReport, RunStatus};
pub use writer::OutputTree;
