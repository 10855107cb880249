//! Export run report
//!
//! This module defines the outcome of one export run, as returned to the CLI
//! and logged at the end of the run.

use crate::domain::{BulkExportError, CacheKey};
use std::fmt;
use std::time::Duration;

/// Terminal status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every resume-set node was exported
    Completed,
    /// Cancellation was requested; counters reflect partial progress
    Cancelled,
    /// Cache-only mode generated the node list and stopped
    CacheGenerated,
    /// A node failed and the run was aborted
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Completed => "completed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::CacheGenerated => "cache generated",
            RunStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Summary of an export run
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub job_id: String,
    pub cache_key: CacheKey,
    pub status: RunStatus,

    /// Nodes in the candidate list
    pub total_candidates: usize,

    /// Nodes in the resume set (candidates not yet journaled)
    pub planned: usize,

    /// Nodes exported by this run
    pub exported: usize,

    /// Nodes found in the completion journal at start
    pub previously_completed: usize,

    /// Recoverable problems, in the order they happened
    pub warnings: Vec<String>,

    /// Error that aborted the run
    pub error: Option<BulkExportError>,

    pub duration: Duration,
}

impl ExportReport {
    pub fn new(job_id: impl Into<String>, cache_key: CacheKey) -> Self {
        Self {
            job_id: job_id.into(),
            cache_key,
            status: RunStatus::Completed,
            total_candidates: 0,
            planned: 0,
            exported: 0,
            previously_completed: 0,
            warnings: Vec::new(),
            error: None,
            duration: Duration::from_secs(0),
        }
    }

    /// Completed or cache generated
    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Completed | RunStatus::CacheGenerated)
    }

    /// Log the report
    pub fn log_summary(&self) {
        match self.status {
            RunStatus::Failed => tracing::error!(
                job_id = %self.job_id,
                cache_key = %self.cache_key,
                planned = self.planned,
                exported = self.exported,
                error = %self.error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
                "Export failed"
            ),
            _ => tracing::info!(
                job_id = %self.job_id,
                cache_key = %self.cache_key,
                status = %self.status,
                total_candidates = self.total_candidates,
                planned = self.planned,
                exported = self.exported,
                previously_completed = self.previously_completed,
                duration_secs = self.duration.as_secs(),
                "Export finished"
            ),
        }

        if !self.warnings.is_empty() {
            tracing::warn!(warning_count = self.warnings.len(), "Export finished with warnings");
        }
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Job:                  {}", self.job_id)?;
        writeln!(f, "Cache key:            {}", self.cache_key)?;
        writeln!(f, "Status:               {}", self.status)?;
        writeln!(f, "Total candidates:     {}", self.total_candidates)?;
        writeln!(f, "Resume set:           {}", self.planned)?;
        writeln!(f, "Exported this run:    {}", self.exported)?;
        writeln!(f, "Previously completed: {}", self.previously_completed)?;
        writeln!(f, "Duration:             {:.2}s", self.duration.as_secs_f64())?;
        if let Some(error) = &self.error {
            writeln!(f, "Error:                {error}")?;
        }
        for warning in &self.warnings {
            writeln!(f, "{warning}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: RunStatus) -> ExportReport {
        let mut r = ExportReport::new("job", CacheKey::new("root").unwrap());
        r.status = status;
        r
    }

    #[test]
    fn test_success_statuses() {
        assert!(report(RunStatus::Completed).is_success());
        assert!(report(RunStatus::CacheGenerated).is_success());
        assert!(!report(RunStatus::Cancelled).is_success());
        assert!(!report(RunStatus::Failed).is_success());
    }

    #[test]
    fn test_display_includes_error_and_warnings() {
        let mut r = report(RunStatus::Failed);
        r.error = Some(BulkExportError::Export("disk full".to_string()));
        r.warnings.push("VALIDATE: Stripped invalid XML characters...../a".to_string());
        let text = r.to_string();
        assert!(text.contains("Status:               failed"));
        assert!(text.contains("Export error: disk full"));
        assert!(text.contains("VALIDATE: Stripped"));
    }
}
