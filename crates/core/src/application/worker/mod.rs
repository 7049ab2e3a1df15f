// Worker - Work item execution loop

pub mod constants;
mod panic_guard;
mod pool;
mod shutdown;
mod stats;

use constants::*;
pub use panic_guard::{execute_guarded, from_join_result, PanicGuardResult};
pub use pool::{DrainOutcome, PoolHandle, WorkerPool};
pub use shutdown::{shutdown_channel, ServiceHandle, ShutdownSender, ShutdownToken};
pub use stats::{WorkerStats, WorkerStatsSnapshot};

use crate::domain::{RunOutcome, WorkItem};
use crate::error::Result;
use crate::port::{PayloadHandler, WorkQueue};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Worker consumes items from the work queue, one at a time
pub struct Worker {
    id: usize,
    queue: Arc<dyn WorkQueue>,
    handler: Arc<dyn PayloadHandler>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    pub fn new(
        id: usize,
        queue: Arc<dyn WorkQueue>,
        handler: Arc<dyn PayloadHandler>,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            queue,
            handler,
            stats,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Run worker loop until the queue is closed and drained, or shutdown fires
    pub async fn run(&self, mut shutdown: ShutdownToken) -> Result<()> {
        info!(worker = self.id, "Worker started");
        loop {
            // Check for shutdown signal
            if shutdown.is_shutdown() {
                info!(worker = self.id, "Worker shutting down");
                break;
            }

            let next = tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    info!(worker = self.id, "Worker interrupted while waiting for work");
                    break;
                }
                next = self.queue.dequeue() => next,
            };

            match next {
                Ok(Some(item)) => {
                    self.process(item).await;
                }
                Ok(None) => {
                    info!(worker = self.id, "Queue closed and drained");
                    break;
                }
                Err(e) => {
                    error!(worker = self.id, error = %e, "Worker error");
                    tokio::select! {
                        _ = sleep(ERROR_RECOVERY_SLEEP_DURATION) => {},
                        _ = shutdown.wait() => {
                            info!(worker = self.id, "Worker interrupted during error recovery");
                            break;
                        }
                    }
                }
            }
        }
        info!(worker = self.id, "Worker stopped");
        Ok(())
    }

    /// Dequeue and process one item (returns false once the queue is closed and drained)
    pub async fn process_next(&self) -> Result<bool> {
        match self.queue.dequeue().await? {
            Some(item) => {
                self.process(item).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Execute one item with panic isolation; failures never propagate
    ///
    /// No retry: a failed item is logged, counted and discarded.
    pub async fn process(&self, mut item: WorkItem) -> RunOutcome {
        item.claim();
        info!(worker = self.id, item_id = %item.id, attempt = item.attempts, "Processing work item");

        // Arc so the spawned handler task and the log lines share one copy of the payload
        let item = Arc::new(item);
        let item_for_exec = Arc::clone(&item);
        let handler = Arc::clone(&self.handler);

        let result =
            execute_guarded(async move { handler.handle(&item_for_exec).await }).await;

        let outcome = match result {
            PanicGuardResult::Success(Ok(report)) => {
                info!(
                    worker = self.id,
                    item_id = %item.id,
                    duration_ms = report.duration_ms,
                    exit_code = ?report.exit_code,
                    "Work item completed"
                );
                RunOutcome::Succeeded
            }
            PanicGuardResult::Success(Err(e)) => {
                warn!(worker = self.id, item_id = %item.id, error = %e, "Work item failed, discarding");
                RunOutcome::Failed
            }
            PanicGuardResult::Panicked(msg) => {
                error!(worker = self.id, item_id = %item.id, panic_msg = %msg, "Work item handler panicked");
                RunOutcome::Panicked
            }
            PanicGuardResult::Cancelled => {
                error!(worker = self.id, item_id = %item.id, "Work item handler cancelled");
                RunOutcome::Failed
            }
        };

        self.stats.record(outcome);
        outcome
    }
}
