// Worker Pool - N independent workers sharing one queue

use super::{ShutdownSender, ShutdownToken, Worker, WorkerStats};
use crate::port::{PayloadHandler, WorkQueue};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// Pool of workers consuming the same work queue
pub struct WorkerPool {
    size: usize,
    queue: Arc<dyn WorkQueue>,
    handler: Arc<dyn PayloadHandler>,
    stats: Arc<WorkerStats>,
}

impl WorkerPool {
    /// Create a pool; `size` is clamped to at least one worker
    pub fn new(size: usize, queue: Arc<dyn WorkQueue>, handler: Arc<dyn PayloadHandler>) -> Self {
        Self {
            size: size.max(1),
            queue,
            handler,
            stats: Arc::new(WorkerStats::new()),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Spawn every worker on its own task
    pub fn spawn(self, shutdown: &ShutdownToken) -> PoolHandle {
        info!(workers = self.size, "Starting worker pool");
        let mut tasks = JoinSet::new();
        for id in 0..self.size {
            let worker = Worker::new(
                id,
                Arc::clone(&self.queue),
                Arc::clone(&self.handler),
                Arc::clone(&self.stats),
            );
            let token = shutdown.clone();
            tasks.spawn(async move {
                if let Err(e) = worker.run(token).await {
                    error!(worker = id, error = ?e, "Worker failed");
                }
            });
        }
        PoolHandle {
            tasks,
            stats: self.stats,
        }
    }
}

/// How a pool drain ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every worker exited before the deadline
    Drained,
    /// Workers exited after the shutdown token fired
    Stopped,
    /// Workers were still busy after the grace period and were aborted
    Aborted,
}

/// Handle to a running worker pool
pub struct PoolHandle {
    tasks: JoinSet<()>,
    stats: Arc<WorkerStats>,
}

impl PoolHandle {
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Number of workers still running
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every worker to exit
    ///
    /// Cancel-safe: if interrupted, workers not yet joined stay in the handle.
    pub async fn join(&mut self) {
        while let Some(res) = self.tasks.join_next().await {
            if let Err(e) = res {
                error!(error = ?e, "Worker task ended abnormally");
            }
        }
        info!("Worker pool stopped");
    }

    /// Abort every worker still running
    pub fn abort(&mut self) {
        self.tasks.abort_all();
    }

    /// Wait for workers to drain a closed queue
    ///
    /// After `deadline` the shutdown token fires; workers still running after
    /// a further `grace` are aborted.
    pub async fn drain(
        &mut self,
        deadline: Duration,
        grace: Duration,
        shutdown: &ShutdownSender,
    ) -> DrainOutcome {
        if timeout(deadline, self.join()).await.is_ok() {
            return DrainOutcome::Drained;
        }

        warn!(
            remaining = self.len(),
            deadline_ms = deadline.as_millis() as u64,
            "Workers did not drain in time, signalling shutdown"
        );
        shutdown.shutdown();
        if timeout(grace, self.join()).await.is_ok() {
            return DrainOutcome::Stopped;
        }

        error!(remaining = self.len(), "Aborting workers");
        self.abort();
        while self.tasks.join_next().await.is_some() {}
        DrainOutcome::Aborted
    }
}
