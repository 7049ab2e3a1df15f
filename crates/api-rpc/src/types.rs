//! RPC Request/Response Types
//!
//! JSON-RPC method parameters and results.

use serde::{Deserialize, Serialize};

pub use dispatch_core::application::Acknowledgment;

/// events.ingest.v1 - Accept one event
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub payload: serde_json::Value,
}

/// `{status: "enqueued", data: <payload>}`
pub type IngestResponse = Acknowledgment;

/// admin.stats.v1 - Get engine statistics
#[derive(Debug, Default, Deserialize)]
pub struct StatsRequest {
    // No parameters needed
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub events_accepted: u64,
    pub queue_depth: usize,
    pub queue_closed: bool,
    pub items_processed: u64,
    pub items_failed: u64,
    pub workers: usize,
    pub uptime_seconds: u64,
}
