//! Scheduler - Runs recurring jobs on a fixed tick
//!
//! Idle → Running once per tick: every job whose `next_due <= now` runs in
//! registration order, then `next_due = now + interval`. A failing or
//! panicking job is logged and counted; it never stops the loop or delays
//! another job's schedule.

mod registry;

pub use registry::{JobRegistry, JobSummary, RecurringJob};

use crate::application::worker::{
    execute_guarded, from_join_result, shutdown_channel, PanicGuardResult, ServiceHandle,
    ShutdownToken,
};
use crate::domain::RunOutcome;
use crate::port::{JobError, TimeProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// What one tick did
#[derive(Debug, Default)]
pub struct TickReport {
    pub now: i64,
    /// Jobs started this tick, in registration order
    pub ran: Vec<(String, RunOutcome)>,
}

impl TickReport {
    pub fn ran_job(&self, name: &str) -> bool {
        self.ran.iter().any(|(n, _)| n == name)
    }
}

/// Single cooperative loop over the job registry
pub struct Scheduler {
    registry: JobRegistry,
    time_provider: Arc<dyn TimeProvider>,
    tick_interval: Duration,
}

impl Scheduler {
    pub fn new(
        registry: JobRegistry,
        time_provider: Arc<dyn TimeProvider>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            registry,
            time_provider,
            tick_interval,
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Run every due job once
    ///
    /// Inline jobs are awaited here; detached jobs are launched and reaped on a
    /// later tick.
    pub async fn tick(&mut self) -> TickReport {
        let now = self.time_provider.now_millis();
        self.reap_detached().await;

        let mut report = TickReport {
            now,
            ran: Vec::new(),
        };

        for job in self.registry.iter_mut() {
            if job.next_due > now {
                continue;
            }

            let outcome = if job.is_detached() {
                if job.in_flight.is_some() {
                    warn!(job = %job.name(), "Previous run still in flight, skipping");
                    job.skipped_count += 1;
                    RunOutcome::Skipped
                } else {
                    debug!(job = %job.name(), "Launching detached job");
                    let action = job.action();
                    job.in_flight = Some(tokio::spawn(async move { action.run().await }));
                    job.run_count += 1;
                    RunOutcome::Launched
                }
            } else {
                let action = job.action();
                let result = execute_guarded(async move { action.run().await }).await;
                job.run_count += 1;
                let outcome = classify(job.name(), result);
                record(job, outcome);
                outcome
            };

            // Advance even after a failure so a broken job can't spin every tick
            job.next_due = now + job.interval_millis();
            report.ran.push((job.name().to_string(), outcome));
        }

        report
    }

    /// Collect detached runs that have finished
    async fn reap_detached(&mut self) {
        for job in self.registry.iter_mut() {
            let finished = job.in_flight.as_ref().is_some_and(|h| h.is_finished());
            if !finished {
                continue;
            }
            if let Some(handle) = job.in_flight.take() {
                let outcome = classify(job.name(), from_join_result(handle.await));
                record(job, outcome);
            }
        }
    }

    /// Tick until shutdown, then hand the registry back
    pub async fn run(mut self, mut shutdown: ShutdownToken) -> JobRegistry {
        info!(
            jobs = self.registry.len(),
            tick_ms = self.tick_interval.as_millis() as u64,
            "Scheduler started"
        );

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    if !report.ran.is_empty() {
                        debug!(now = report.now, ran = report.ran.len(), "Scheduler tick");
                    }
                }
                _ = shutdown.wait() => {
                    info!("Scheduler received shutdown signal");
                    break;
                }
            }
        }

        for job in self.registry.iter_mut() {
            if let Some(handle) = job.in_flight.take() {
                if !handle.is_finished() {
                    warn!(job = %job.name(), "Aborting detached run on shutdown");
                }
                handle.abort();
            }
        }

        info!("Scheduler stopped");
        self.registry
    }

    /// Start the loop on its own task
    pub fn spawn(self) -> ServiceHandle<JobRegistry> {
        let (tx, token) = shutdown_channel();
        let join = tokio::spawn(self.run(token));
        ServiceHandle::new(tx, join)
    }
}

fn classify(name: &str, result: PanicGuardResult<Result<(), JobError>>) -> RunOutcome {
    match result {
        PanicGuardResult::Success(Ok(())) => {
            debug!(job = %name, "Recurring job succeeded");
            RunOutcome::Succeeded
        }
        PanicGuardResult::Success(Err(e)) => {
            error!(job = %name, error = %e, "Recurring job failed");
            RunOutcome::Failed
        }
        PanicGuardResult::Panicked(msg) => {
            error!(job = %name, panic_msg = %msg, "Recurring job panicked");
            RunOutcome::Panicked
        }
        PanicGuardResult::Cancelled => {
            warn!(job = %name, "Recurring job cancelled");
            RunOutcome::Failed
        }
    }
}

fn record(job: &mut RecurringJob, outcome: RunOutcome) {
    if outcome.is_failure() {
        job.failure_count += 1;
    }
    job.last_outcome = Some(outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::job_action::mocks::{CountingAction, PanickingAction};
    use crate::port::time_provider::mocks::ManualTimeProvider;

    fn scheduler_with(
        jobs: Vec<RecurringJob>,
        clock: Arc<ManualTimeProvider>,
    ) -> Scheduler {
        let mut registry = JobRegistry::new();
        for job in jobs {
            registry.register(job, clock.now_millis()).unwrap();
        }
        Scheduler::new(registry, clock, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_intervals_30_and_10_over_35_ticks() {
        let clock = Arc::new(ManualTimeProvider::new(0));
        let slow = CountingAction::new();
        let fast = CountingAction::new();
        let mut scheduler = scheduler_with(
            vec![
                RecurringJob::new("every-30", Duration::from_millis(30), Arc::new(slow.clone())),
                RecurringJob::new("every-10", Duration::from_millis(10), Arc::new(fast.clone())),
            ],
            clock.clone(),
        );

        for _ in 0..35 {
            clock.advance(1);
            scheduler.tick().await;
        }

        assert_eq!(fast.runs(), 3);
        assert_eq!(slow.runs(), 1);
        assert_eq!(scheduler.registry().get("every-10").unwrap().run_count(), 3);
    }

    #[tokio::test]
    async fn test_job_failure_is_isolated() {
        let clock = Arc::new(ManualTimeProvider::new(0));
        let broken = CountingAction::failing();
        let healthy = CountingAction::new();
        let mut scheduler = scheduler_with(
            vec![
                RecurringJob::new("broken", Duration::from_millis(5), Arc::new(broken.clone())),
                RecurringJob::new("healthy", Duration::from_millis(5), Arc::new(healthy.clone())),
            ],
            clock.clone(),
        );

        clock.set(5);
        let report = scheduler.tick().await;

        assert!(report.ran_job("broken") && report.ran_job("healthy"));
        assert_eq!(healthy.runs(), 1);

        let job = scheduler.registry().get("broken").unwrap();
        assert_eq!(job.failure_count(), 1);
        assert_eq!(job.last_outcome(), Some(RunOutcome::Failed));
        assert_eq!(job.next_due(), 10, "next_due advances past the failed run");
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_stop_others() {
        let clock = Arc::new(ManualTimeProvider::new(0));
        let healthy = CountingAction::new();
        let mut scheduler = scheduler_with(
            vec![
                RecurringJob::new("panics", Duration::from_millis(2), Arc::new(PanickingAction)),
                RecurringJob::new("healthy", Duration::from_millis(2), Arc::new(healthy.clone())),
            ],
            clock.clone(),
        );

        for _ in 0..4 {
            clock.advance(1);
            scheduler.tick().await;
        }

        assert_eq!(healthy.runs(), 2);
        let job = scheduler.registry().get("panics").unwrap();
        assert_eq!(job.run_count(), 2);
        assert_eq!(job.last_outcome(), Some(RunOutcome::Panicked));
    }

    #[tokio::test]
    async fn test_nothing_runs_before_due() {
        let clock = Arc::new(ManualTimeProvider::new(0));
        let action = CountingAction::new();
        let mut scheduler = scheduler_with(
            vec![RecurringJob::new("later", Duration::from_millis(100), Arc::new(action.clone()))],
            clock.clone(),
        );

        clock.set(99);
        let report = scheduler.tick().await;

        assert!(report.ran.is_empty());
        assert_eq!(action.runs(), 0);
    }

    #[tokio::test]
    async fn test_slow_detached_job_does_not_block_tick() {
        let clock = Arc::new(ManualTimeProvider::new(0));
        let slow = CountingAction::slow(Duration::from_secs(60));
        let fast = CountingAction::new();
        let mut scheduler = scheduler_with(
            vec![
                RecurringJob::new("slow", Duration::from_millis(1), Arc::new(slow.clone()))
                    .detached(true),
                RecurringJob::new("fast", Duration::from_millis(1), Arc::new(fast.clone())),
            ],
            clock.clone(),
        );

        clock.advance(1);
        let first = tokio::time::timeout(Duration::from_secs(1), scheduler.tick())
            .await
            .expect("tick must not wait for the detached job");
        assert!(first
            .ran
            .contains(&("slow".to_string(), RunOutcome::Launched)));
        let slow_job = scheduler.registry().get("slow").unwrap();
        assert!(slow_job.is_running());
        assert_eq!(slow_job.last_outcome(), None);

        // Second tick: slow is still running, so it is skipped; fast keeps going
        clock.advance(1);
        let report = scheduler.tick().await;

        assert!(report
            .ran
            .contains(&("slow".to_string(), RunOutcome::Skipped)));
        assert_eq!(fast.runs(), 2);
        let slow_job = scheduler.registry().get("slow").unwrap();
        assert_eq!(slow_job.run_count(), 1);
        assert_eq!(slow_job.skipped_count(), 1);
        assert_eq!(slow_job.next_due(), 3);
    }

    #[tokio::test]
    async fn test_detached_failure_recorded_on_reap() {
        let clock = Arc::new(ManualTimeProvider::new(0));
        let broken = CountingAction::failing();
        let mut scheduler = scheduler_with(
            vec![RecurringJob::new("broken", Duration::from_millis(10), Arc::new(broken))
                .detached(true)],
            clock.clone(),
        );

        clock.set(10);
        let launch = scheduler.tick().await;
        assert_eq!(launch.ran, vec![("broken".to_string(), RunOutcome::Launched)]);

        // Let the detached task finish before the next reap
        for _ in 0..100 {
            if !scheduler.registry().get("broken").unwrap().is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        clock.set(11);
        scheduler.tick().await;

        let job = scheduler.registry().get("broken").unwrap();
        assert_eq!(job.failure_count(), 1);
        assert_eq!(job.last_outcome(), Some(RunOutcome::Failed));
    }

    #[tokio::test]
    async fn test_spawned_scheduler_stops_cleanly() {
        let clock = Arc::new(crate::port::time_provider::MonotonicTimeProvider::new());
        let action = CountingAction::new();
        let mut registry = JobRegistry::new();
        registry
            .register(
                RecurringJob::new("quick", Duration::from_millis(5), Arc::new(action.clone())),
                clock.now_millis(),
            )
            .unwrap();

        let handle = Scheduler::new(registry, clock, Duration::from_millis(5)).spawn();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let registry = handle.stop().await.unwrap();

        assert!(action.runs() >= 1);
        assert_eq!(registry.get("quick").unwrap().run_count() as usize, action.runs());
    }
}
