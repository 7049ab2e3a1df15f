//! Prometheus metrics
//!
//! One registry per router. Values are copied from the engine's live handles
//! at scrape time, so nothing is registered globally.

use axum::http::StatusCode;
use dispatch_core::application::WorkerStats;
use dispatch_core::domain::EventCounter;
use dispatch_core::port::WorkQueue;
use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use std::sync::{Arc, Mutex};

pub struct EngineMetrics {
    registry: Registry,
    events_accepted: IntCounter,
    queue_depth: IntGauge,
    items_processed: IntCounter,
    items_failed: IntCounter,
    // Serializes read-then-advance across concurrent scrapes
    refresh_lock: Mutex<()>,
}

impl EngineMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let events_accepted = IntCounter::with_opts(Opts::new(
            "dispatch_events_accepted_total",
            "Events accepted and enqueued by the ingress",
        ))?;
        let queue_depth = IntGauge::with_opts(Opts::new(
            "dispatch_queue_depth",
            "Work items waiting in the queue",
        ))?;
        let items_processed = IntCounter::with_opts(Opts::new(
            "dispatch_work_items_processed_total",
            "Work items that reached a terminal outcome",
        ))?;
        let items_failed = IntCounter::with_opts(Opts::new(
            "dispatch_work_items_failed_total",
            "Work items whose handler failed or panicked",
        ))?;

        registry.register(Box::new(events_accepted.clone()))?;
        registry.register(Box::new(queue_depth.clone()))?;
        registry.register(Box::new(items_processed.clone()))?;
        registry.register(Box::new(items_failed.clone()))?;

        Ok(Self {
            registry,
            events_accepted,
            queue_depth,
            items_processed,
            items_failed,
            refresh_lock: Mutex::new(()),
        })
    }

    /// Copy current engine values into the registry
    pub async fn refresh(
        &self,
        counter: &EventCounter,
        queue: &Arc<dyn WorkQueue>,
        stats: &WorkerStats,
    ) {
        let depth = queue.len().await as i64;

        let _guard = self.refresh_lock.lock().unwrap_or_else(|e| e.into_inner());
        advance(&self.events_accepted, counter.get());
        advance(&self.items_processed, stats.processed());
        advance(&self.items_failed, stats.failed());
        self.queue_depth.set(depth);
    }

    /// Prometheus text exposition of the registry
    pub fn render(&self) -> (StatusCode, String) {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = vec![];
        match encoder.encode(&metric_families, &mut buffer) {
            Ok(()) => {
                let response = String::from_utf8(buffer).unwrap_or_default();
                (StatusCode::OK, response)
            }
            Err(e) => {
                tracing::error!("Failed to encode metrics: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to encode metrics: {}", e),
                )
            }
        }
    }
}

/// Counters only move forward; catch up to the source value
fn advance(metric: &IntCounter, target: u64) {
    let current = metric.get();
    if target > current {
        metric.inc_by(target - current);
    }
}
