//! RPC Method Handlers
//!
//! Implements the logic behind each JSON-RPC method.

use crate::error::to_rpc_error;
use crate::types::{IngestRequest, IngestResponse, StatsRequest, StatsResponse};
use dispatch_core::application::{IngressService, WorkerStats};
use dispatch_core::port::WorkQueue;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use std::time::Instant;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    ingress: Arc<IngressService>,
    worker_stats: Arc<WorkerStats>,
    workers: usize,
    start_time: Instant,
}

impl RpcHandler {
    pub fn new(ingress: Arc<IngressService>, worker_stats: Arc<WorkerStats>, workers: usize) -> Self {
        Self {
            ingress,
            worker_stats,
            workers,
            start_time: Instant::now(),
        }
    }

    /// events.ingest.v1
    pub async fn ingest(&self, params: IngestRequest) -> Result<IngestResponse, ErrorObjectOwned> {
        self.ingress
            .accept(params.payload)
            .await
            .map_err(to_rpc_error)
    }

    /// admin.stats.v1
    pub async fn stats(&self, _params: StatsRequest) -> Result<StatsResponse, ErrorObjectOwned> {
        let queue = self.ingress.queue();

        Ok(StatsResponse {
            events_accepted: self.ingress.counter().get(),
            queue_depth: queue.len().await,
            queue_closed: queue.is_closed(),
            items_processed: self.worker_stats.processed(),
            items_failed: self.worker_stats.failed(),
            workers: self.workers,
            uptime_seconds: self.start_time.elapsed().as_secs(),
        })
    }
}
