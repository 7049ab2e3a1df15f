//! HTTP API Layer
//!
//! Event ingress (`POST /events`), Prometheus metrics (`GET /metrics`),
//! dashboard (`GET /`) and health (`GET /health`).

pub mod dashboard;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use metrics::EngineMetrics;
pub use routes::{router, AppState};
pub use server::{HttpServer, HttpServerConfig};
