//! Runtime state of one export run
//!
//! An `ExportJob` is shared through an `Arc` between the single thread that
//! drives the run and any number of status pollers. Counters are atomics so
//! pollers never block the writer.

use crate::domain::JobScope;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Point-in-time copy of a job's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobProgress {
    pub total_candidates: usize,
    pub remaining_candidates: usize,
    pub previously_completed: usize,
    pub exported: usize,
    pub cancel_requested: bool,
}

/// Export job with cooperative cancellation and progress counters
#[derive(Debug)]
pub struct ExportJob {
    job_id: String,
    cancel_requested: AtomicBool,
    total_candidates: AtomicUsize,
    remaining_candidates: AtomicUsize,
    previously_completed: AtomicUsize,
    exported: AtomicUsize,
}

impl ExportJob {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            cancel_requested: AtomicBool::new(false),
            total_candidates: AtomicUsize::new(0),
            remaining_candidates: AtomicUsize::new(0),
            previously_completed: AtomicUsize::new(0),
            exported: AtomicUsize::new(0),
        }
    }

    /// Job id for a scope: the root node, else the from-date, else a UUID
    pub fn id_for_scope(scope: &JobScope) -> String {
        match scope {
            JobScope::Descent { root } => root.to_string(),
            JobScope::Modified { range, .. } => range
                .from
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Asks the run to stop at its next checkpoint
    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    pub fn set_total_candidates(&self, n: usize) {
        self.total_candidates.store(n, Ordering::Relaxed);
    }

    pub fn add_total_candidates(&self, n: usize) {
        self.total_candidates.fetch_add(n, Ordering::Relaxed);
    }

    pub fn set_remaining_candidates(&self, n: usize) {
        self.remaining_candidates.store(n, Ordering::Relaxed);
    }

    pub fn set_previously_completed(&self, n: usize) {
        self.previously_completed.store(n, Ordering::Relaxed);
    }

    /// Records one finished node
    pub fn node_done(&self) {
        self.exported.fetch_add(1, Ordering::Relaxed);
        let _ = self
            .remaining_candidates
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn total_candidates(&self) -> usize {
        self.total_candidates.load(Ordering::Relaxed)
    }

    pub fn remaining_candidates(&self) -> usize {
        self.remaining_candidates.load(Ordering::Relaxed)
    }

    pub fn previously_completed(&self) -> usize {
        self.previously_completed.load(Ordering::Relaxed)
    }

    pub fn exported(&self) -> usize {
        self.exported.load(Ordering::Relaxed)
    }

    pub fn progress(&self) -> JobProgress {
        JobProgress {
            total_candidates: self.total_candidates(),
            remaining_candidates: self.remaining_candidates(),
            previously_completed: self.previously_completed(),
            exported: self.exported(),
            cancel_requested: self.is_cancel_requested(),
        }
    }
}
