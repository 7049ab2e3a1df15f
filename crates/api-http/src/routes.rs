//! HTTP routes

use crate::dashboard::render_dashboard;
use crate::error::ApiError;
use crate::metrics::EngineMetrics;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use dispatch_core::application::{Acknowledgment, IngressService, WorkerStats};
use dispatch_core::port::WorkQueue;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub ingress: Arc<IngressService>,
    pub worker_stats: Arc<WorkerStats>,
    pub metrics: Arc<EngineMetrics>,
}

impl AppState {
    pub fn new(
        ingress: Arc<IngressService>,
        worker_stats: Arc<WorkerStats>,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            ingress,
            worker_stats,
            metrics: Arc::new(EngineMetrics::new()?),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/events", post(ingest_event))
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(state)
}

async fn ingest_event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Acknowledgment>, ApiError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {}", e)))?;
    let ack = state.ingress.accept(payload).await?;
    debug!(events_accepted = state.ingress.counter().get(), "HTTP event accepted");
    Ok(Json(ack))
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    state
        .metrics
        .refresh(
            state.ingress.counter(),
            state.ingress.queue(),
            &state.worker_stats,
        )
        .await;
    let (status, body) = state.metrics.render();
    (status, [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body)
}

async fn dashboard(State(state): State<AppState>) -> Html<String> {
    let queue = state.ingress.queue();
    Html(render_dashboard(
        state.ingress.counter().get(),
        queue.len().await,
        queue.is_closed(),
    ))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "queue_closed": state.ingress.queue().is_closed(),
    }))
}
