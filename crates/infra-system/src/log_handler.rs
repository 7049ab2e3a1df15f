// In-process payload handler: logs each item

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use dispatch_core::domain::WorkItem;
use dispatch_core::port::{HandlerError, HandlerReport, PayloadHandler, TimeProvider};

/// Example processing function
///
/// Payload fields it understands:
/// - `delay_ms`: sleep this long before completing (simulated work)
/// - `fail`: when `true`, the item fails
pub struct LogPayloadHandler {
    time_provider: Arc<dyn TimeProvider>,
}

impl LogPayloadHandler {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }
}

#[async_trait]
impl PayloadHandler for LogPayloadHandler {
    async fn handle(&self, item: &WorkItem) -> Result<HandlerReport, HandlerError> {
        let start = self.time_provider.now_millis();
        info!(item_id = %item.id, payload = %item.payload.as_value(), "Handling work item");

        if let Some(delay_ms) = item.payload.field("delay_ms").and_then(|v| v.as_u64()) {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if item.payload.field("fail").and_then(|v| v.as_bool()) == Some(true) {
            return Err(HandlerError::Failed(format!(
                "item {} requested failure",
                item.id
            )));
        }

        Ok(HandlerReport {
            duration_ms: self.time_provider.now_millis() - start,
            exit_code: None,
            output: None,
        })
    }
}
