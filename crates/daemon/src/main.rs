//! Dispatch Daemon - Main Entry Point
//! HTTP + JSON-RPC ingress, worker pool and recurring job scheduler

mod config;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Import workspace crates
use dispatch_api_http::{AppState, HttpServer, HttpServerConfig};
use dispatch_api_rpc::{RpcHandler, RpcServer, RpcServerConfig};
use dispatch_core::application::worker::constants::{WORKER_ABORT_GRACE, WORKER_DRAIN_TIMEOUT};
use dispatch_core::application::{
    shutdown_channel, DrainOutcome, IngressService, JobRegistry, RecurringJob, Scheduler, WorkerPool,
};
use dispatch_core::domain::EventCounter;
use dispatch_core::port::id_provider::UuidProvider;
use dispatch_core::port::time_provider::{MonotonicTimeProvider, SystemTimeProvider};
use dispatch_core::port::{JobAction, SystemProbe, TimeProvider, WorkQueue};
use dispatch_infra_memory::InMemoryWorkQueue;
use dispatch_infra_system::{
    build_handler, DelayedCheck, JobKind, QueueDepthReport, SysinfoProbe, SystemHealthCheck,
};

use crate::config::{DaemonConfig, JobConfig, LogFormat};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration (logging depends on it)
    let config = DaemonConfig::load()?;

    // 2. Initialize logging
    init_logging(config.log.format)?;
    info!("Dispatch daemon v{} starting...", VERSION);

    // 3. Setup dependencies (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let queue: Arc<dyn WorkQueue> = Arc::new(InMemoryWorkQueue::new());
    let counter = EventCounter::new();
    let ingress = Arc::new(IngressService::new(
        Arc::clone(&queue),
        counter.clone(),
        Arc::new(UuidProvider),
        Arc::clone(&time_provider),
    ));

    // 4. Start worker pool
    let handler = build_handler(
        config.workers.handler,
        Arc::clone(&time_provider),
        config.workers.env_allowlist.clone(),
    );
    info!(
        workers = config.workers.count,
        handler = %config.workers.handler,
        "Starting worker pool..."
    );
    let pool = WorkerPool::new(config.workers.count, Arc::clone(&queue), handler);
    let worker_stats = pool.stats();
    let (shutdown_tx, shutdown_token) = shutdown_channel();
    let mut pool_handle = pool.spawn(&shutdown_token);

    // 5. Start scheduler
    let scheduler_clock: Arc<dyn TimeProvider> = Arc::new(MonotonicTimeProvider::new());
    let probe: Arc<dyn SystemProbe> = Arc::new(SysinfoProbe::new());
    let mut registry = JobRegistry::new();
    for job in &config.scheduler.jobs {
        let action = build_job_action(job, &probe, &queue, &counter);
        let recurring = RecurringJob::new(&job.name, Duration::from_millis(job.interval_ms), action)
            .detached(job.detached);
        registry
            .register(recurring, scheduler_clock.now_millis())
            .with_context(|| format!("Invalid scheduler job '{}'", job.name))?;
    }
    let scheduler_handle = Scheduler::new(
        registry,
        scheduler_clock,
        Duration::from_millis(config.scheduler.tick_ms),
    )
    .spawn();

    // 6. Start HTTP server
    let state = AppState::new(Arc::clone(&ingress), Arc::clone(&worker_stats))
        .context("Failed to build metrics registry")?;
    let (http_addr, http_handle) = HttpServer::new(
        HttpServerConfig {
            host: config.http.host.clone(),
            port: config.http.port,
        },
        state,
    )
    .start()
    .await
    .context("HTTP server start failed")?;

    // 7. Start JSON-RPC server
    let rpc_server = RpcServer::new(
        RpcServerConfig {
            host: config.rpc.host.clone(),
            port: config.rpc.port,
        },
        RpcHandler::new(ingress, worker_stats, config.workers.count),
    );
    let (rpc_addr, rpc_handle) = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(http = %http_addr, rpc = %rpc_addr, "System ready. Waiting for events...");
    info!("Press Ctrl+C to shutdown");

    // 8. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 9. Graceful shutdown: ingress first so nothing new arrives
    if let Err(e) = http_handle.stop().await {
        warn!(error = %e, "HTTP server did not stop cleanly");
    }
    if let Err(e) = rpc_handle.stop() {
        warn!(error = %e, "RPC server already stopped");
    }
    rpc_handle.stopped().await;

    queue.close().await;
    info!(pending = queue.len().await, "Queue closed, draining workers...");

    let drain = pool_handle
        .drain(WORKER_DRAIN_TIMEOUT, WORKER_ABORT_GRACE, &shutdown_tx)
        .await;
    if drain != DrainOutcome::Drained {
        let pending = queue.len().await;
        warn!(outcome = ?drain, pending, "Worker pool did not drain");
    }
    shutdown_tx.shutdown();

    match scheduler_handle.stop().await {
        Ok(registry) => {
            for job in registry.summaries() {
                info!(
                    job = %job.name,
                    runs = job.run_count,
                    failures = job.failure_count,
                    skipped = job.skipped_count,
                    "Recurring job summary"
                );
            }
        }
        Err(e) => error!(error = %e, "Scheduler did not stop cleanly"),
    }

    let stats = pool_handle.stats().snapshot();
    info!(
        events_accepted = counter.get(),
        processed = stats.processed,
        failed = stats.failed,
        "Shutdown complete."
    );
    telemetry::shutdown();

    Ok(())
}

fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("dispatch=info"))
        .context("Failed to create env filter")?;

    let fmt_layer = match format {
        // Production: JSON structured logging
        LogFormat::Json => fmt::layer().json().boxed(),
        // Development: Pretty formatting with colors
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    };

    // Telemetry errors are reported once the subscriber is up
    let (otel_layer, otel_error) = match telemetry::layer() {
        Ok(layer) => (layer, None),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(e) = otel_error {
        warn!(error = %e, "OpenTelemetry disabled (continuing without it)");
    }
    Ok(())
}

fn build_job_action(
    job: &JobConfig,
    probe: &Arc<dyn SystemProbe>,
    queue: &Arc<dyn WorkQueue>,
    counter: &EventCounter,
) -> Arc<dyn JobAction> {
    match job.kind {
        JobKind::SystemHealth => Arc::new(SystemHealthCheck::new(Arc::clone(probe))),
        JobKind::QueueDepth => Arc::new(QueueDepthReport::new(Arc::clone(queue), counter.clone())),
        JobKind::DelayedCheck => Arc::new(DelayedCheck::new(Duration::from_millis(job.delay_ms))),
    }
}
