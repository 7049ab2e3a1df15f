//! Recurring Job Registry
//!
//! Static set of named jobs, built at startup and owned by the scheduler task.

use crate::domain::error::{DomainError, Result};
use crate::domain::RunOutcome;
use crate::port::{JobAction, JobError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A named action re-run every `interval`
pub struct RecurringJob {
    name: String,
    interval: Duration,
    action: Arc<dyn JobAction>,
    detached: bool,

    pub(super) next_due: i64, // scheduler clock, ms
    pub(super) run_count: u64,
    pub(super) failure_count: u64,
    pub(super) skipped_count: u64,
    pub(super) last_outcome: Option<RunOutcome>,
    pub(super) in_flight: Option<JoinHandle<std::result::Result<(), JobError>>>,
}

impl RecurringJob {
    pub fn new(name: impl Into<String>, interval: Duration, action: Arc<dyn JobAction>) -> Self {
        Self {
            name: name.into(),
            interval,
            action,
            detached: false,
            next_due: 0,
            run_count: 0,
            failure_count: 0,
            skipped_count: 0,
            last_outcome: None,
            in_flight: None,
        }
    }

    /// Run on a separate task instead of inside the tick
    ///
    /// For actions that may block; a slow detached run never delays other jobs.
    pub fn detached(mut self, detached: bool) -> Self {
        self.detached = detached;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub(super) fn interval_millis(&self) -> i64 {
        self.interval.as_millis() as i64
    }

    pub(super) fn action(&self) -> Arc<dyn JobAction> {
        Arc::clone(&self.action)
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn next_due(&self) -> i64 {
        self.next_due
    }

    pub fn run_count(&self) -> u64 {
        self.run_count
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped_count
    }

    pub fn last_outcome(&self) -> Option<RunOutcome> {
        self.last_outcome
    }

    /// True while a detached run is still executing
    pub fn is_running(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            name: self.name.clone(),
            interval_ms: self.interval_millis(),
            detached: self.detached,
            next_due: self.next_due,
            run_count: self.run_count,
            failure_count: self.failure_count,
            skipped_count: self.skipped_count,
            last_outcome: self.last_outcome,
        }
    }
}

/// Serializable view of a registered job
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub name: String,
    pub interval_ms: i64,
    pub detached: bool,
    pub next_due: i64,
    pub run_count: u64,
    pub failure_count: u64,
    pub skipped_count: u64,
    pub last_outcome: Option<RunOutcome>,
}

/// Jobs in registration order
#[derive(Default)]
pub struct JobRegistry {
    jobs: Vec<RecurringJob>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job; first run is due one interval after `now_millis`
    ///
    /// # Errors
    /// - `DomainError::DuplicateJob` if the name is taken
    /// - `DomainError::InvalidInterval` for intervals under one millisecond
    pub fn register(&mut self, mut job: RecurringJob, now_millis: i64) -> Result<()> {
        if job.interval_millis() < 1 {
            return Err(DomainError::InvalidInterval {
                name: job.name,
                reason: "interval must be at least 1ms".to_string(),
            });
        }
        if self.get(&job.name).is_some() {
            return Err(DomainError::DuplicateJob(job.name));
        }

        job.next_due = now_millis + job.interval_millis();
        tracing::info!(
            job = %job.name,
            interval_ms = job.interval_millis(),
            detached = job.detached,
            "Registering recurring job"
        );
        self.jobs.push(job);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RecurringJob> {
        self.jobs.iter().find(|j| j.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecurringJob> {
        self.jobs.iter()
    }

    pub(super) fn iter_mut(&mut self) -> impl Iterator<Item = &mut RecurringJob> {
        self.jobs.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn summaries(&self) -> Vec<JobSummary> {
        self.jobs.iter().map(RecurringJob::summary).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::job_action::mocks::CountingAction;

    fn job(name: &str, interval_ms: u64) -> RecurringJob {
        RecurringJob::new(
            name,
            Duration::from_millis(interval_ms),
            Arc::new(CountingAction::new()),
        )
    }

    #[test]
    fn test_first_run_is_one_interval_out() {
        let mut registry = JobRegistry::new();
        registry.register(job("a", 30), 100).unwrap();
        assert_eq!(registry.get("a").unwrap().next_due(), 130);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = JobRegistry::new();
        registry.register(job("a", 10), 0).unwrap();
        let err = registry.register(job("a", 20), 0).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateJob(name) if name == "a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut registry = JobRegistry::new();
        assert!(matches!(
            registry.register(job("z", 0), 0),
            Err(DomainError::InvalidInterval { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut registry = JobRegistry::new();
        for name in ["c", "a", "b"] {
            registry.register(job(name, 5), 0).unwrap();
        }
        let names: Vec<&str> = registry.iter().map(|j| j.name()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
