//! Recurring job actions
//!
//! Each type implements `JobAction` and is registered with the scheduler by
//! the daemon from its `scheduler.jobs` config.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use dispatch_core::domain::EventCounter;
use dispatch_core::port::{JobAction, JobError, SystemProbe, WorkQueue};

/// CPU usage above which the health check warns
pub const CPU_WARN_PERCENT: f32 = 90.0;

/// Configurable job kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    SystemHealth,
    QueueDepth,
    DelayedCheck,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SystemHealth => "system-health",
            Self::QueueDepth => "queue-depth",
            Self::DelayedCheck => "delayed-check",
        };
        f.write_str(s)
    }
}

/// Samples CPU and memory through the `SystemProbe`
pub struct SystemHealthCheck {
    probe: Arc<dyn SystemProbe>,
}

impl SystemHealthCheck {
    pub fn new(probe: Arc<dyn SystemProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl JobAction for SystemHealthCheck {
    async fn run(&self) -> Result<(), JobError> {
        let metrics = self.probe.get_metrics().await;

        if metrics.memory_total_mb == 0 {
            return Err(JobError::ExecutionFailed(
                "memory statistics unavailable".to_string(),
            ));
        }

        let memory_percent = metrics.memory_used_mb as f64 * 100.0 / metrics.memory_total_mb as f64;
        info!(
            cpu_percent = metrics.cpu_usage_percent,
            memory_used_mb = metrics.memory_used_mb,
            memory_total_mb = metrics.memory_total_mb,
            memory_percent = (memory_percent * 10.0).round() / 10.0,
            disk_used_gb = metrics.disk_used_gb,
            disk_total_gb = metrics.disk_total_gb,
            "System health"
        );

        if metrics.cpu_usage_percent > CPU_WARN_PERCENT {
            warn!(cpu_percent = metrics.cpu_usage_percent, "CPU usage is high");
        }
        Ok(())
    }
}

/// Logs queue depth, closed flag and the accepted-event counter
pub struct QueueDepthReport {
    queue: Arc<dyn WorkQueue>,
    counter: EventCounter,
}

impl QueueDepthReport {
    pub fn new(queue: Arc<dyn WorkQueue>, counter: EventCounter) -> Self {
        Self { queue, counter }
    }
}

#[async_trait]
impl JobAction for QueueDepthReport {
    async fn run(&self) -> Result<(), JobError> {
        let depth = self.queue.len().await;
        info!(
            depth,
            closed = self.queue.is_closed(),
            events_accepted = self.counter.get(),
            "Queue report"
        );
        Ok(())
    }
}

/// Sleeps for its delay, then logs
pub struct DelayedCheck {
    delay: Duration,
}

impl DelayedCheck {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl JobAction for DelayedCheck {
    async fn run(&self) -> Result<(), JobError> {
        tokio::time::sleep(self.delay).await;
        info!(delay_ms = self.delay.as_millis() as u64, "Delayed check finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_core::domain::WorkItem;
    use dispatch_core::port::system_probe::mocks::MockSystemProbe;
    use dispatch_core::port::work_queue::mocks::MockWorkQueue;
    use serde_json::json;

    #[tokio::test]
    async fn test_health_check_ok() {
        let check = SystemHealthCheck::new(Arc::new(MockSystemProbe::new(95.0)));
        assert!(check.run().await.is_ok());
    }

    #[tokio::test]
    async fn test_health_check_fails_without_memory_stats() {
        let probe = Arc::new(MockSystemProbe::new(10.0));
        probe.set_memory_total(0);

        let result = SystemHealthCheck::new(probe).run().await;

        assert!(matches!(result, Err(JobError::ExecutionFailed(_))));
    }

    #[tokio::test]
    async fn test_queue_report_reads_live_state() {
        let queue = Arc::new(MockWorkQueue::with_items(vec![WorkItem::new_test(json!({}))]));
        let counter = EventCounter::new();
        counter.increment();

        let report = QueueDepthReport::new(queue, counter);

        assert!(report.run().await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_queue_report_runs_on_spawned_task() {
        let queue: Arc<dyn WorkQueue> = Arc::new(MockWorkQueue::new());
        let action: Arc<dyn JobAction> = Arc::new(QueueDepthReport::new(queue, EventCounter::new()));

        let result = tokio::spawn(async move { action.run().await }).await.unwrap();

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delayed_check_sleeps() {
        let start = tokio::time::Instant::now();
        DelayedCheck::new(Duration::from_millis(20)).run().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_job_kind_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: JobKind,
        }
        let w: Wrapper = serde_json::from_value(json!({"kind": "queue-depth"})).unwrap();
        assert_eq!(w.kind, JobKind::QueueDepth);
        assert_eq!(JobKind::SystemHealth.to_string(), "system-health");
    }
}
