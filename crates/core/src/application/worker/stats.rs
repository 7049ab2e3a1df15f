// Worker pool counters

use crate::domain::RunOutcome;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Completed-item counters shared by every worker of a pool
#[derive(Debug, Default)]
pub struct WorkerStats {
    succeeded: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkerStatsSnapshot {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub panicked: u64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: RunOutcome) {
        match outcome {
            RunOutcome::Succeeded => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
            }
            RunOutcome::Failed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            // Panics count as failures too
            RunOutcome::Panicked => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.panicked.fetch_add(1, Ordering::Relaxed);
            }
            RunOutcome::Skipped | RunOutcome::Launched => {}
        }
    }

    /// Items that reached a terminal outcome
    pub fn processed(&self) -> u64 {
        self.succeeded() + self.failed()
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn panicked(&self) -> u64 {
        self.panicked.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        let succeeded = self.succeeded();
        let failed = self.failed();
        WorkerStatsSnapshot {
            processed: succeeded + failed,
            succeeded,
            failed,
            panicked: self.panicked(),
        }
    }
}
